//! HTTP API for launching and inspecting Lifelab experiments.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`POST /run_experiment`** to validate, create and start an
//!   experiment on a background task
//! - **Status and listing endpoints** that read experiments and their
//!   generation traces back from storage while runs are in progress
//!
//! All handlers go through the shared [`ExperimentRunner`] in
//! [`AppState`], so the same code serves the `PostgreSQL` and in-memory
//! backends.
//!
//! [`ExperimentRunner`]: lifelab_core::runner::ExperimentRunner

pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, LabRunner};
