//! Error types for the experiment API.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Bodies
//! are always `{"error": message, "status": code}`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifelab_core::runner::RunError;
use lifelab_core::store::StoreError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request parameters were rejected.
    #[error("invalid request: {0}")]
    Validation(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ObserverError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) | StoreError::ExperimentNotFound(id) => {
                Self::NotFound(format!("Experiment ID {id} not found."))
            }
            other => Self::Internal(format!("Database error: {other}")),
        }
    }
}

impl From<RunError> for ObserverError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Validation(e) => Self::Validation(e.to_string()),
            other => Self::Internal(format!("Database error during setup: {other}")),
        }
    }
}

impl From<JsonRejection> for ObserverError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ObserverError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ObserverError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
