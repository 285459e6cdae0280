//! Storage interfaces for experiments and their generation traces.
//!
//! The runner depends only on these traits. `lifelab-db` implements them
//! against `PostgreSQL`; [`crate::memory::MemoryStore`] implements them in
//! process for tests and single-node use.
//!
//! Implementations own all concurrency control. Every method is a
//! suspension point and any failure surfaces as a [`StoreError`]; the core
//! never retries.

use std::future::Future;

use chrono::{DateTime, Utc};
use lifelab_types::{
    Experiment, ExperimentId, ExperimentStatus, GenerationTrace, NewExperiment, TraceId,
};

use crate::board::{Board, BoardError};
use crate::codec;

/// Errors returned by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No experiment with this id.
    #[error("experiment {0} not found")]
    NotFound(ExperimentId),

    /// A terminal transition was requested on a finished experiment.
    #[error("experiment {experiment_id} is already {status}")]
    AlreadyTerminal {
        /// The experiment.
        experiment_id: ExperimentId,
        /// Its current, terminal status.
        status: ExperimentStatus,
    },

    /// A trace row for this generation already exists.
    #[error("generation {generation} of experiment {experiment_id} is already recorded")]
    DuplicateGeneration {
        /// The experiment.
        experiment_id: ExperimentId,
        /// The generation number.
        generation: u32,
    },

    /// A trace was appended for an experiment that does not exist.
    #[error("cannot record trace: experiment {0} does not exist")]
    ExperimentNotFound(ExperimentId),

    /// The board could not be turned into a valid trace row.
    #[error(transparent)]
    InvalidBoard(#[from] BoardError),

    /// The backing store failed (connection, timeout, constraint, ...).
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap any backend error as [`StoreError::Storage`].
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Durable experiment records.
pub trait ExperimentStore: Send + Sync {
    /// Insert a `RUNNING` experiment and return its id.
    fn create(
        &self,
        new: &NewExperiment,
    ) -> impl Future<Output = Result<ExperimentId, StoreError>> + Send;

    /// Transition a running experiment to `COMPLETED` at `end_time`.
    ///
    /// Sets `end_time` and `duration_seconds = end_time - start_time`.
    /// Fails with [`StoreError::AlreadyTerminal`] without touching the
    /// row if the experiment has already finished.
    fn complete(
        &self,
        id: ExperimentId,
        end_time: DateTime<Utc>,
    ) -> impl Future<Output = Result<Experiment, StoreError>> + Send;

    /// Transition a running experiment to `FAILED` at `end_time`.
    ///
    /// Same semantics as [`ExperimentStore::complete`].
    fn fail(
        &self,
        id: ExperimentId,
        end_time: DateTime<Utc>,
    ) -> impl Future<Output = Result<Experiment, StoreError>> + Send;

    /// Read one experiment.
    fn get(&self, id: ExperimentId)
    -> impl Future<Output = Result<Experiment, StoreError>> + Send;

    /// Newest experiments first, at most `limit`.
    fn list_recent(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Experiment>, StoreError>> + Send;
}

/// Append-only sink for generation traces.
pub trait TraceSink: Send + Sync {
    /// Record `board` as generation `generation` of `experiment_id`.
    ///
    /// Never overwrites: an existing `(experiment_id, generation)` row
    /// yields [`StoreError::DuplicateGeneration`].
    fn append(
        &self,
        experiment_id: ExperimentId,
        generation: u32,
        board: &Board,
        captured_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<TraceId, StoreError>> + Send;
}

/// Read access to recorded traces.
pub trait TraceReader: Send + Sync {
    /// All traces of `experiment_id`, ordered by generation.
    fn traces(
        &self,
        experiment_id: ExperimentId,
    ) -> impl Future<Output = Result<Vec<GenerationTrace>, StoreError>> + Send;
}

/// A trace row ready to be written: encoded and count-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// Generation number.
    pub generation_num: u32,
    /// Capture timestamp.
    pub capture_time: DateTime<Utc>,
    /// Encoded board.
    pub board_state: String,
    /// Live cells in `board_state`.
    pub live_cells_count: u32,
}

impl TraceRecord {
    /// Encode `board` and check that its live count matches the encoding.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::LiveCountMismatch`] if the grid count and the
    /// alive symbols disagree, or [`BoardError::TooLarge`] if the count does
    /// not fit the row.
    pub fn capture(
        generation_num: u32,
        board: &Board,
        capture_time: DateTime<Utc>,
    ) -> Result<Self, BoardError> {
        let board_state = codec::encode(board);
        let counted = codec::count_live(board);
        let encoded = codec::count_alive_symbols(&board_state);
        if counted != encoded {
            return Err(BoardError::LiveCountMismatch { counted, encoded });
        }
        let live_cells_count =
            u32::try_from(counted).map_err(|_| BoardError::TooLarge { size: board.size() })?;
        Ok(Self {
            generation_num,
            capture_time,
            board_state,
            live_cells_count,
        })
    }

    /// The stored row once the backend has assigned `trace_id`.
    pub fn into_trace(self, trace_id: TraceId, experiment_id: ExperimentId) -> GenerationTrace {
        GenerationTrace {
            trace_id,
            experiment_id,
            generation_num: self.generation_num,
            capture_time: self.capture_time,
            board_state: self.board_state,
            live_cells_count: self.live_cells_count,
        }
    }
}
