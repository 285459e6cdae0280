//! Error types for the Lifelab service binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the service binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lifelab_core::config::ConfigError,
    },

    /// Storage backend could not be opened.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying database error.
        #[from]
        source: lifelab_db::DbError,
    },

    /// Experiment API server failed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: lifelab_observer::ServerError,
    },
}
