//! Lifelab service binary.
//!
//! Wires configuration, logging, the storage backend, the experiment
//! runner and the HTTP API together, then serves until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Resolve the config path (`LIFELAB_CONFIG`, else `lifelab-config.yaml`)
//! 2. Load configuration, applying environment overrides
//! 3. Initialize structured logging (tracing)
//! 4. Open the storage backend (memory, or `PostgreSQL` with migrations)
//! 5. Build the experiment runner from the engine settings
//! 6. Serve the API until shutdown
//! 7. Close the storage backend

mod error;

use std::path::PathBuf;

use lifelab_core::config::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE, LabConfig, LogFormat, LoggingConfig,
};
use lifelab_core::runner::RunnerSettings;
use lifelab_db::StorageBackend;
use lifelab_observer::{AppState, ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, storage or the server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run().await.map_err(Into::into)
}

async fn run() -> Result<(), EngineError> {
    // 1-2. Load configuration.
    let config_path = resolve_config_path(|key| std::env::var(key).ok());
    let config = LabConfig::load_or_default(&config_path)?;

    // 3. Initialize structured logging.
    init_logging(&config.logging);

    info!(config = %config_path.display(), "lifelab-engine starting");
    info!(
        storage = ?config.infrastructure.storage,
        max_board_size = config.engine.max_board_size,
        max_steps = config.engine.max_steps,
        step_delay_ms = config.engine.step_delay_ms,
        "Configuration loaded"
    );

    // 4. Open storage.
    let backend = StorageBackend::from_config(&config.infrastructure).await?;
    info!(backend = backend.name(), "Storage backend ready");

    // 5. Assemble the runner.
    let state = AppState::new(backend.clone(), RunnerSettings::from_config(&config.engine));

    // 6. Serve.
    let served = start_server(&ServerConfig::from_config(&config.infrastructure), state).await;

    // 7. Release storage even when serving failed.
    backend.close().await;
    served?;

    info!("lifelab-engine shutdown complete");
    Ok(())
}

/// Config file named by `CONFIG_PATH_ENV`, else the default file in the
/// working directory.
fn resolve_config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(CONFIG_PATH_ENV)
        .filter(|path| !path.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
}

/// `RUST_LOG` wins over the configured level; an unparsable level falls back to `info`.
fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(logging))
        .with_target(true);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
