//! Axum router construction for the experiment API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for the control UI and request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- service banner
/// - `POST /run_experiment` -- start an experiment
/// - `GET /status/{id}` -- experiment status
/// - `GET /api/experiments` -- list experiments
/// - `GET /api/experiments/{id}/traces` -- generation traces
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/run_experiment", post(handlers::run_experiment))
        .route("/status/{id}", get(handlers::experiment_status))
        .route("/api/experiments", get(handlers::list_experiments))
        .route("/api/experiments/{id}/traces", get(handlers::list_traces))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
