//! Rule engine, board codec, storage interfaces and experiment runner for Lifelab.
//!
//! This crate owns the deterministic core: evolving a board under a
//! birth/survival rule, encoding every generation, and driving an
//! experiment through `RUNNING` to `COMPLETED` or `FAILED` against
//! pluggable stores.
//!
//! # Modules
//!
//! - [`rules`] -- `B<digits>/S<digits>` parsing into a typed [`RuleSet`].
//! - [`board`] -- The bounded square grid.
//! - [`codec`] -- Fixed-width row-major text encoding of boards.
//! - [`engine`] -- Single-step evolution and the [`Generations`] iterator.
//! - [`seed`] -- Explicit and seeded-random starting boards.
//! - [`params`] -- Experiment parameters and validation.
//! - [`clock`] -- Microsecond timestamps and exact durations.
//! - [`store`] -- [`ExperimentStore`], [`TraceSink`] and [`TraceReader`].
//! - [`memory`] -- In-process implementation of the store traits.
//! - [`runner`] -- [`ExperimentRunner`], the experiment state machine.
//! - [`config`] -- Configuration loading from `lifelab-config.yaml`.
//!
//! [`RuleSet`]: rules::RuleSet
//! [`Generations`]: engine::Generations
//! [`ExperimentStore`]: store::ExperimentStore
//! [`TraceSink`]: store::TraceSink
//! [`TraceReader`]: store::TraceReader
//! [`ExperimentRunner`]: runner::ExperimentRunner

pub mod board;
pub mod clock;
pub mod codec;
pub mod config;
pub mod engine;
pub mod memory;
pub mod params;
pub mod rules;
pub mod runner;
pub mod seed;
pub mod store;
