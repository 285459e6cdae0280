//! Shared record types for the Lifelab experiment engine.
//!
//! This crate is the single source of truth for the persisted shapes used
//! across the workspace: experiment rows, generation trace rows, their
//! identifiers and the lifecycle status. Types flow downstream to
//! `TypeScript` via `ts-rs` for the control UI.
//!
//! # Modules
//!
//! - [`ids`] -- Integer newtypes for store-assigned identifiers
//! - [`enums`] -- Experiment lifecycle status
//! - [`structs`] -- Experiment and generation trace records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ExperimentStatus, UnknownStatus};
pub use ids::{ExperimentId, TraceId};
pub use structs::{Experiment, GenerationTrace, NewExperiment};
