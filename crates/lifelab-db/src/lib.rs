//! `PostgreSQL` persistence for Lifelab experiments and generation traces.
//!
//! Implements the `lifelab-core` store traits against the `raw_data`
//! schema and provides [`StorageBackend`], the runtime switch between
//! `PostgreSQL` and the in-memory store.
//!
//! # Schema
//!
//! ```text
//! raw_data.experiments        one row per experiment (RUNNING -> COMPLETED | FAILED)
//!     |
//!     +-- raw_data.generation_trace   one row per generation, unique per experiment
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`experiment_store`] -- Experiment creation, terminal transitions, reads
//! - [`trace_store`] -- Append-only trace insertion and ordered reads
//! - [`backend`] -- Enum dispatch over `PostgreSQL` and memory
//! - [`error`] -- Shared error types

pub mod backend;
pub mod error;
pub mod experiment_store;
pub mod postgres;
pub mod trace_store;

// Re-export primary types for convenience.
pub use backend::StorageBackend;
pub use error::DbError;
pub use experiment_store::{ExperimentRow, ExperimentTable};
pub use postgres::{PostgresConfig, PostgresPool};
pub use trace_store::{TraceRow, TraceTable};
