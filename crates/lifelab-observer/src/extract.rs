//! Request extractors that report rejections as [`ObserverError`].
//!
//! Axum's own extractors answer a malformed body, path or query string
//! with a plain-text response. These wrappers route the rejection
//! through [`ObserverError`] so every error body is
//! `{"error": message, "status": code}`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ObserverError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ObserverError))]
pub struct ApiJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ObserverError))]
pub struct ApiPath<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ObserverError))]
pub struct ApiQuery<T>(pub T);
