//! Experiment runner: validate, create, step, trace, finish.
//!
//! This module provides [`ExperimentRunner`], which drives one experiment
//! through its lifecycle:
//!
//! - **Validate**: parameters, rules and the starting board are checked
//!   before anything is persisted
//! - **Create**: the experiment row is inserted as `RUNNING`
//! - **Step**: generations `0..=num_steps` are computed and appended in
//!   order, one trace row each
//! - **Finish**: the row moves to `COMPLETED`, or to `FAILED` when a trace
//!   write fails mid-run (partial traces are kept)
//!
//! The board is a value threaded through the [`Generations`] iterator, so
//! runs never share grid state. Many runs may execute concurrently; the
//! stores own all cross-run coordination.

use std::sync::Arc;
use std::time::Duration;

use lifelab_types::{Experiment, ExperimentId, GenerationTrace};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::board::Board;
use crate::clock;
use crate::config::EngineConfig;
use crate::engine::Generations;
use crate::params::{ExperimentParams, ParamLimits, ValidationError};
use crate::rules::RuleSet;
use crate::seed::SeedDefaults;
use crate::store::{ExperimentStore, StoreError, TraceReader, TraceSink};

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Parameters were rejected; nothing was persisted.
    #[error("invalid experiment parameters: {0}")]
    Validation(#[from] ValidationError),

    /// The experiment row could not be created; nothing was persisted.
    #[error("could not create experiment: {0}")]
    Storage(#[source] StoreError),

    /// A trace write failed mid-run.
    ///
    /// Traces up to `last_generation` are kept. `marked_failed` tells
    /// whether the experiment was moved to `FAILED`.
    #[error(
        "experiment {experiment_id} aborted after generation {last_generation:?} \
         (marked failed: {marked_failed}): {source}"
    )]
    Aborted {
        /// The experiment.
        experiment_id: ExperimentId,
        /// Last generation durably written, `None` if not even generation 0.
        last_generation: Option<u32>,
        /// Whether the `FAILED` transition succeeded.
        marked_failed: bool,
        /// The append failure.
        #[source]
        source: StoreError,
    },

    /// Every generation was written but the `COMPLETED` transition failed.
    ///
    /// The experiment may still read `RUNNING` and needs manual
    /// reconciliation.
    #[error("experiment {experiment_id} recorded all generations but could not complete: {source}")]
    Completion {
        /// The experiment.
        experiment_id: ExperimentId,
        /// The store failure.
        #[source]
        source: StoreError,
    },
}

impl RunError {
    /// The experiment this error belongs to, if one was created.
    pub const fn experiment_id(&self) -> Option<ExperimentId> {
        match self {
            Self::Validation(_) | Self::Storage(_) => None,
            Self::Aborted { experiment_id, .. } | Self::Completion { experiment_id, .. } => {
                Some(*experiment_id)
            }
        }
    }
}

/// Tunables applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunnerSettings {
    /// Pause between consecutive generations.
    pub step_delay: Duration,
    /// Parameter bounds.
    pub limits: ParamLimits,
    /// Random-board fallbacks.
    pub seed_defaults: SeedDefaults,
}

impl RunnerSettings {
    /// Settings from the `engine` config section.
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self {
            step_delay: Duration::from_millis(config.step_delay_ms),
            limits: ParamLimits {
                max_board_size: config.max_board_size,
                max_steps: config.max_steps,
            },
            seed_defaults: SeedDefaults {
                density: config.default_density,
                seed: config.default_seed,
            },
        }
    }
}

/// A created experiment that has not started stepping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRun {
    /// The `RUNNING` experiment.
    pub experiment_id: ExperimentId,
    /// Parsed rules.
    pub rules: RuleSet,
    /// Generations to compute after generation 0.
    pub num_steps: u32,
    /// Generation 0.
    pub initial_board: Board,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// The `COMPLETED` experiment.
    pub experiment: Experiment,
    /// Trace rows written, `num_steps + 1`.
    pub generations_recorded: u32,
    /// Live cells in the last generation.
    pub final_live_cells: usize,
}

/// A run executing on a background task.
#[derive(Debug)]
pub struct SpawnedRun {
    /// The experiment, already `RUNNING` in the store.
    pub experiment_id: ExperimentId,
    /// Resolves when the run finishes.
    pub handle: JoinHandle<Result<RunReport, RunError>>,
}

/// Drives experiments against an experiment store and a trace sink.
#[derive(Debug)]
pub struct ExperimentRunner<E, T> {
    experiments: E,
    traces: T,
    settings: RunnerSettings,
}

impl<E, T> ExperimentRunner<E, T>
where
    E: ExperimentStore,
    T: TraceSink,
{
    /// Build a runner over the given stores.
    pub const fn new(experiments: E, traces: T, settings: RunnerSettings) -> Self {
        Self {
            experiments,
            traces,
            settings,
        }
    }

    /// Settings applied to every run.
    pub const fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Validate `params` and create the `RUNNING` experiment.
    ///
    /// # Errors
    ///
    /// [`RunError::Validation`] if the parameters are rejected and
    /// [`RunError::Storage`] if the row cannot be created. In both cases
    /// nothing is persisted.
    pub async fn prepare(&self, params: &ExperimentParams) -> Result<PreparedRun, RunError> {
        let validated = params.validate(&self.settings.limits, &self.settings.seed_defaults)?;
        let new = validated.new_experiment(clock::now());
        let experiment_id = self
            .experiments
            .create(&new)
            .await
            .map_err(RunError::Storage)?;

        info!(
            %experiment_id,
            name = %new.name,
            board_size = new.board_size,
            num_steps = new.num_steps,
            rules = %new.rules_notation,
            initial = %new.initial_config,
            "Experiment created"
        );

        Ok(PreparedRun {
            experiment_id,
            rules: validated.rules,
            num_steps: validated.num_steps,
            initial_board: validated.initial_board,
        })
    }

    /// Step a prepared experiment to completion.
    ///
    /// Writes generations `0..=num_steps` in order, pausing
    /// `step_delay` between them, then marks the experiment `COMPLETED`.
    ///
    /// # Errors
    ///
    /// [`RunError::Aborted`] if a trace write fails (the experiment is
    /// marked `FAILED` on a best-effort basis) and
    /// [`RunError::Completion`] if the final transition fails.
    pub async fn execute(&self, prepared: PreparedRun) -> Result<RunReport, RunError> {
        let PreparedRun {
            experiment_id,
            rules,
            num_steps,
            initial_board,
        } = prepared;

        let mut last_generation: Option<u32> = None;
        let mut final_live_cells = 0;

        for (generation, board) in (0..=num_steps).zip(Generations::new(initial_board, rules)) {
            if generation > 0 && !self.settings.step_delay.is_zero() {
                tokio::time::sleep(self.settings.step_delay).await;
            }

            match self
                .traces
                .append(experiment_id, generation, &board, clock::now())
                .await
            {
                Ok(trace_id) => {
                    final_live_cells = board.live_count();
                    last_generation = Some(generation);
                    debug!(
                        %experiment_id,
                        generation,
                        %trace_id,
                        live_cells = final_live_cells,
                        "Generation recorded"
                    );
                }
                Err(source) => {
                    return Err(self.abort(experiment_id, last_generation, source).await);
                }
            }
        }

        let experiment = self
            .experiments
            .complete(experiment_id, clock::now())
            .await
            .map_err(|source| {
                error!(%experiment_id, error = %source, "Experiment could not be completed");
                RunError::Completion {
                    experiment_id,
                    source,
                }
            })?;

        let generations_recorded = last_generation.map_or(0, |g| g.saturating_add(1));
        info!(
            %experiment_id,
            generations = generations_recorded,
            final_live_cells,
            duration_seconds = ?experiment.duration_seconds,
            "Experiment completed"
        );

        Ok(RunReport {
            experiment,
            generations_recorded,
            final_live_cells,
        })
    }

    /// Validate, create and execute in one call.
    ///
    /// # Errors
    ///
    /// Any error of [`ExperimentRunner::prepare`] or
    /// [`ExperimentRunner::execute`].
    pub async fn run(&self, params: &ExperimentParams) -> Result<RunReport, RunError> {
        let prepared = self.prepare(params).await?;
        self.execute(prepared).await
    }

    /// Read an experiment's current state. Safe while it is running.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown ids, or a backend failure.
    pub async fn status(&self, id: ExperimentId) -> Result<Experiment, StoreError> {
        self.experiments.get(id).await
    }

    /// Newest experiments first.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<Experiment>, StoreError> {
        self.experiments.list_recent(limit).await
    }

    async fn abort(
        &self,
        experiment_id: ExperimentId,
        last_generation: Option<u32>,
        source: StoreError,
    ) -> RunError {
        warn!(
            %experiment_id,
            ?last_generation,
            error = %source,
            "Trace write failed, marking experiment FAILED"
        );
        let marked_failed = match self.experiments.fail(experiment_id, clock::now()).await {
            Ok(_) => true,
            Err(err) => {
                error!(%experiment_id, error = %err, "Experiment could not be marked FAILED");
                false
            }
        };
        RunError::Aborted {
            experiment_id,
            last_generation,
            marked_failed,
            source,
        }
    }
}

impl<E, T> ExperimentRunner<E, T>
where
    E: ExperimentStore + 'static,
    T: TraceSink + 'static,
{
    /// Create the experiment now and execute it on a background task.
    ///
    /// Returns as soon as the experiment row exists, so callers can poll
    /// [`ExperimentRunner::status`] with the returned id.
    ///
    /// # Errors
    ///
    /// Same as [`ExperimentRunner::prepare`]. Errors from the run itself
    /// are delivered through the join handle.
    pub async fn spawn(self: &Arc<Self>, params: &ExperimentParams) -> Result<SpawnedRun, RunError> {
        let prepared = self.prepare(params).await?;
        let experiment_id = prepared.experiment_id;
        let runner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = runner.execute(prepared).await;
            if let Err(err) = &outcome {
                error!(%experiment_id, error = %err, "Background experiment ended with an error");
            }
            outcome
        });
        Ok(SpawnedRun {
            experiment_id,
            handle,
        })
    }
}

impl<E, T> ExperimentRunner<E, T>
where
    E: ExperimentStore,
    T: TraceSink + TraceReader,
{
    /// Recorded traces of an experiment, ordered by generation.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for unknown experiments, or a backend failure.
    pub async fn traces(&self, id: ExperimentId) -> Result<Vec<GenerationTrace>, StoreError> {
        self.traces.traces(id).await
    }
}
