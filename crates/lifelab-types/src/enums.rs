//! Enumeration types for the Lifelab experiment engine.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle status of an experiment.
///
/// The only legal transitions are `Running -> Completed` and
/// `Running -> Failed`, each taken at most once. The storage form is the
/// upper-case word (`RUNNING`, `COMPLETED`, `FAILED`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum ExperimentStatus {
    /// The experiment row exists and generations are still being written.
    Running,
    /// Every requested generation was recorded.
    Completed,
    /// A durable write failed; the partial trace is kept.
    Failed,
}

impl ExperimentStatus {
    /// The storage and wire representation of this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether no further transition is allowed from this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of the three known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown experiment status: {:?}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ExperimentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}
