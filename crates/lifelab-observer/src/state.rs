//! Shared application state for the experiment API.
//!
//! [`AppState`] holds the experiment runner. Handlers launch runs through
//! it and read status and traces back from its stores, so the HTTP layer
//! never touches storage directly.

use std::sync::Arc;

use lifelab_core::runner::{ExperimentRunner, RunnerSettings};
use lifelab_db::StorageBackend;

/// Runner type served by the API: the same backend records experiments and traces.
pub type LabRunner = ExperimentRunner<StorageBackend, StorageBackend>;

/// Default number of experiments returned by the listing endpoint.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Shared state passed to every Axum handler via [`axum::extract::State`].
#[derive(Debug, Clone)]
pub struct AppState {
    /// Runner used to launch and inspect experiments.
    pub runner: Arc<LabRunner>,
}

impl AppState {
    /// State over an existing backend.
    pub fn new(backend: StorageBackend, settings: RunnerSettings) -> Self {
        Self {
            runner: Arc::new(ExperimentRunner::new(backend.clone(), backend, settings)),
        }
    }

    /// State over a fresh in-memory backend.
    pub fn in_memory(settings: RunnerSettings) -> Self {
        Self::new(StorageBackend::memory(), settings)
    }
}
