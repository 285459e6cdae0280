//! Persisted record structs: experiments and their generation traces.
//!
//! These mirror the `raw_data.experiments` and `raw_data.generation_trace`
//! tables one-to-one. Boards appear here only in their encoded text form;
//! the in-memory grid lives in `lifelab-core`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ExperimentStatus;
use crate::ids::{ExperimentId, TraceId};

/// Everything needed to insert a new experiment row.
///
/// Produced by parameter validation; the store assigns the id and sets
/// the status to [`ExperimentStatus::Running`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExperiment {
    /// Human-readable experiment name.
    pub name: String,
    /// Side length of the square board.
    pub board_size: u32,
    /// Number of generations to compute after generation 0.
    pub num_steps: u32,
    /// Descriptor of the initial board (encoded cells or a seed descriptor).
    pub initial_config: String,
    /// Wall-clock time the experiment started.
    pub start_time: DateTime<Utc>,
    /// Canonical rule notation, e.g. `B3/S23`.
    pub rules_notation: String,
    /// Sorted neighbor counts that keep a live cell alive.
    pub survival_rules: Vec<u8>,
    /// Sorted neighbor counts that bring a dead cell to life.
    pub birth_rules: Vec<u8>,
}

/// An experiment row as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Experiment {
    /// Store-assigned identifier.
    pub experiment_id: ExperimentId,
    /// Human-readable experiment name.
    pub name: String,
    /// Side length of the square board.
    pub board_size: u32,
    /// Number of generations requested after generation 0.
    pub num_steps: u32,
    /// Descriptor of the initial board.
    pub initial_config: String,
    /// Wall-clock time the experiment started.
    pub start_time: DateTime<Utc>,
    /// Wall-clock time of the terminal transition, if any.
    pub end_time: Option<DateTime<Utc>>,
    /// Exact `end_time - start_time` in seconds (microsecond scale).
    #[ts(type = "string | null")]
    pub duration_seconds: Option<Decimal>,
    /// Lifecycle status.
    pub status: ExperimentStatus,
    /// Canonical rule notation.
    pub rules_notation: String,
    /// Sorted survival neighbor counts.
    pub survival_rules: Vec<u8>,
    /// Sorted birth neighbor counts.
    pub birth_rules: Vec<u8>,
}

impl Experiment {
    /// Build the freshly created, still running record for `new`.
    pub fn running(experiment_id: ExperimentId, new: &NewExperiment) -> Self {
        Self {
            experiment_id,
            name: new.name.clone(),
            board_size: new.board_size,
            num_steps: new.num_steps,
            initial_config: new.initial_config.clone(),
            start_time: new.start_time,
            end_time: None,
            duration_seconds: None,
            status: ExperimentStatus::Running,
            rules_notation: new.rules_notation.clone(),
            survival_rules: new.survival_rules.clone(),
            birth_rules: new.birth_rules.clone(),
        }
    }

    /// Whether the experiment has reached `COMPLETED` or `FAILED`.
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One recorded generation of an experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GenerationTrace {
    /// Store-assigned surrogate key.
    pub trace_id: TraceId,
    /// Owning experiment.
    pub experiment_id: ExperimentId,
    /// Generation number, contiguous from 0.
    pub generation_num: u32,
    /// Wall-clock time the generation was captured.
    pub capture_time: DateTime<Utc>,
    /// Row-major encoded board.
    pub board_state: String,
    /// Number of live cells in `board_state`.
    pub live_cells_count: u32,
}
