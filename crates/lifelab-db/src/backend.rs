//! Storage backend selected at startup.
//!
//! The store traits use `impl Future` return types and are not
//! dyn-compatible, so the runtime choice between `PostgreSQL` and the
//! in-memory store is an enum that dispatches to the concrete backend.

use chrono::{DateTime, Utc};
use lifelab_core::board::Board;
use lifelab_core::config::{InfrastructureConfig, StorageKind};
use lifelab_core::memory::MemoryStore;
use lifelab_core::store::{ExperimentStore, StoreError, TraceReader, TraceSink};
use lifelab_types::{
    Experiment, ExperimentId, ExperimentStatus, GenerationTrace, NewExperiment, TraceId,
};

use crate::error::DbError;
use crate::postgres::{PostgresConfig, PostgresPool};

/// A store implementing every storage trait, chosen at runtime.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Durable `PostgreSQL` storage.
    Postgres(PostgresPool),
    /// In-process storage.
    Memory(MemoryStore),
}

impl StorageBackend {
    /// A fresh in-memory backend.
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// Build the backend named by `config.storage`.
    ///
    /// For `PostgreSQL` this connects and runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if connecting or migrating fails.
    pub async fn from_config(config: &InfrastructureConfig) -> Result<Self, DbError> {
        match config.storage {
            StorageKind::Memory => {
                tracing::info!("Using in-memory storage");
                Ok(Self::memory())
            }
            StorageKind::Postgres => {
                let pool = PostgresPool::connect(&PostgresConfig::from_config(config)).await?;
                pool.run_migrations().await?;
                Ok(Self::Postgres(pool))
            }
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Release backend resources.
    pub async fn close(&self) {
        if let Self::Postgres(pool) = self {
            pool.close().await;
        }
    }

    async fn finish(
        &self,
        id: ExperimentId,
        end_time: DateTime<Utc>,
        status: ExperimentStatus,
    ) -> Result<Experiment, StoreError> {
        match (self, status) {
            (Self::Postgres(pool), _) => pool.experiments().finish(id, end_time, status).await,
            (Self::Memory(store), ExperimentStatus::Failed) => store.fail(id, end_time).await,
            (Self::Memory(store), _) => store.complete(id, end_time).await,
        }
    }
}

impl ExperimentStore for StorageBackend {
    async fn create(&self, new: &NewExperiment) -> Result<ExperimentId, StoreError> {
        match self {
            Self::Postgres(pool) => pool.experiments().create(new).await,
            Self::Memory(store) => store.create(new).await,
        }
    }

    async fn complete(
        &self,
        id: ExperimentId,
        end_time: DateTime<Utc>,
    ) -> Result<Experiment, StoreError> {
        self.finish(id, end_time, ExperimentStatus::Completed).await
    }

    async fn fail(&self, id: ExperimentId, end_time: DateTime<Utc>) -> Result<Experiment, StoreError> {
        self.finish(id, end_time, ExperimentStatus::Failed).await
    }

    async fn get(&self, id: ExperimentId) -> Result<Experiment, StoreError> {
        match self {
            Self::Postgres(pool) => pool.experiments().get(id).await,
            Self::Memory(store) => store.get(id).await,
        }
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Experiment>, StoreError> {
        match self {
            Self::Postgres(pool) => pool.experiments().list_recent(limit).await,
            Self::Memory(store) => store.list_recent(limit).await,
        }
    }
}

impl TraceSink for StorageBackend {
    async fn append(
        &self,
        experiment_id: ExperimentId,
        generation: u32,
        board: &Board,
        captured_at: DateTime<Utc>,
    ) -> Result<TraceId, StoreError> {
        match self {
            Self::Postgres(pool) => {
                pool.traces()
                    .append(experiment_id, generation, board, captured_at)
                    .await
            }
            Self::Memory(store) => {
                store
                    .append(experiment_id, generation, board, captured_at)
                    .await
            }
        }
    }
}

impl TraceReader for StorageBackend {
    async fn traces(&self, experiment_id: ExperimentId) -> Result<Vec<GenerationTrace>, StoreError> {
        match self {
            Self::Postgres(pool) => pool.traces().traces(experiment_id).await,
            Self::Memory(store) => store.traces(experiment_id).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lifelab_core::clock;
    use lifelab_core::codec::decode;

    use super::*;

    fn new_experiment() -> NewExperiment {
        NewExperiment {
            name: String::from("backend"),
            board_size: 2,
            num_steps: 0,
            initial_config: String::from("1001"),
            start_time: clock::now(),
            rules_notation: String::from("B3/S23"),
            survival_rules: vec![2, 3],
            birth_rules: vec![3],
        }
    }

    #[tokio::test]
    async fn memory_backend_dispatches() {
        let backend = StorageBackend::memory();
        assert_eq!(backend.name(), "memory");

        let id = backend.create(&new_experiment()).await.unwrap();
        let board = decode("1001", 2).unwrap();
        backend.append(id, 0, &board, clock::now()).await.unwrap();

        let failed = backend.fail(id, clock::now()).await.unwrap();
        assert_eq!(failed.status, ExperimentStatus::Failed);
        assert!(matches!(
            backend.complete(id, clock::now()).await,
            Err(StoreError::AlreadyTerminal { .. })
        ));
        assert_eq!(backend.traces(id).await.unwrap().len(), 1);
        assert_eq!(backend.list_recent(5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn memory_config_needs_no_database() {
        let backend = StorageBackend::from_config(&InfrastructureConfig::default())
            .await
            .unwrap();
        assert!(matches!(backend, StorageBackend::Memory(_)));
        backend.close().await;
    }
}
