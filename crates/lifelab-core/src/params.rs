//! Experiment parameters and their validation.
//!
//! Everything that can be rejected is rejected here, before any row is
//! written: size and step bounds, rule notation, density, and the decode
//! of an explicit starting pattern.

use chrono::{DateTime, Utc};
use lifelab_types::NewExperiment;
use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardError};
use crate::rules::{RuleError, RuleSet};
use crate::seed::{InitialConfig, SeedDefaults};

/// Largest accepted board side by default.
pub const DEFAULT_MAX_BOARD_SIZE: u32 = 512;

/// Largest accepted step count by default.
pub const DEFAULT_MAX_STEPS: u32 = 10_000;

/// Reasons a parameter set is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Name is empty or whitespace.
    #[error("experiment name must not be empty")]
    EmptyName,

    /// `board_size <= 0`.
    #[error("board_size must be positive, got {0}")]
    NonPositiveBoardSize(i64),

    /// `board_size` exceeds the configured limit.
    #[error("board_size {size} exceeds the limit of {max}")]
    BoardTooLarge {
        /// Requested size.
        size: i64,
        /// Configured maximum.
        max: u32,
    },

    /// `num_steps < 0`.
    #[error("num_steps must not be negative, got {0}")]
    NegativeSteps(i64),

    /// `num_steps` exceeds the configured limit.
    #[error("num_steps {steps} exceeds the limit of {max}")]
    TooManySteps {
        /// Requested steps.
        steps: i64,
        /// Configured maximum.
        max: u32,
    },

    /// Random density outside `[0, 1]`.
    #[error("initial density must be within [0, 1], got {0}")]
    InvalidDensity(f64),

    /// Rule notation did not parse.
    #[error(transparent)]
    Rules(#[from] RuleError),

    /// Initial pattern did not decode.
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Upper bounds applied during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamLimits {
    /// Largest board side.
    pub max_board_size: u32,
    /// Largest step count.
    pub max_steps: u32,
}

impl Default for ParamLimits {
    fn default() -> Self {
        Self {
            max_board_size: DEFAULT_MAX_BOARD_SIZE,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Caller-supplied experiment parameters, as received.
///
/// Sizes are signed so that out-of-range requests reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentParams {
    /// Human-readable name.
    pub name: String,
    /// Side length of the square board.
    pub board_size: i64,
    /// Generations to compute after generation 0.
    pub num_steps: i64,
    /// `B<digits>/S<digits>` notation.
    pub rules_notation: String,
    /// Starting board; `None` means a random fill with the configured defaults.
    #[serde(default)]
    pub initial_config: Option<InitialConfig>,
}

impl ExperimentParams {
    /// Parameters for a Conway run with a default random start.
    pub fn new(name: impl Into<String>, board_size: i64, num_steps: i64) -> Self {
        Self {
            name: name.into(),
            board_size,
            num_steps,
            rules_notation: String::from(crate::rules::CONWAY_NOTATION),
            initial_config: None,
        }
    }

    /// Replace the rule notation.
    #[must_use]
    pub fn with_rules(mut self, notation: impl Into<String>) -> Self {
        self.rules_notation = notation.into();
        self
    }

    /// Replace the initial configuration.
    #[must_use]
    pub fn with_initial(mut self, initial: InitialConfig) -> Self {
        self.initial_config = Some(initial);
        self
    }

    /// Check every parameter and build the generation-0 board.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(
        &self,
        limits: &ParamLimits,
        defaults: &SeedDefaults,
    ) -> Result<ValidatedParams, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if self.board_size <= 0 {
            return Err(ValidationError::NonPositiveBoardSize(self.board_size));
        }
        let board_size = u32::try_from(self.board_size)
            .ok()
            .filter(|size| *size <= limits.max_board_size)
            .ok_or(ValidationError::BoardTooLarge {
                size: self.board_size,
                max: limits.max_board_size,
            })?;

        if self.num_steps < 0 {
            return Err(ValidationError::NegativeSteps(self.num_steps));
        }
        let num_steps = u32::try_from(self.num_steps)
            .ok()
            .filter(|steps| *steps <= limits.max_steps)
            .ok_or(ValidationError::TooManySteps {
                steps: self.num_steps,
                max: limits.max_steps,
            })?;

        let rules = RuleSet::parse(&self.rules_notation)?;

        let initial = self.initial_config.clone().unwrap_or_else(|| defaults.config());
        if let InitialConfig::Random { density, .. } = initial {
            if !(0.0..=1.0).contains(&density) {
                return Err(ValidationError::InvalidDensity(density));
            }
        }
        let side = usize::try_from(board_size).map_err(|_| BoardError::TooLarge {
            size: usize::MAX,
        })?;
        let initial_board = initial.materialize(side)?;

        Ok(ValidatedParams {
            name: name.to_owned(),
            board_size,
            num_steps,
            rules,
            initial,
            initial_board,
        })
    }
}

/// Parameters that passed validation, with the starting board built.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedParams {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Side length, within limits.
    pub board_size: u32,
    /// Step count, within limits.
    pub num_steps: u32,
    /// Parsed rules.
    pub rules: RuleSet,
    /// How generation 0 was produced.
    pub initial: InitialConfig,
    /// Generation 0.
    pub initial_board: Board,
}

impl ValidatedParams {
    /// The insert record for an experiment starting at `start_time`.
    pub fn new_experiment(&self, start_time: DateTime<Utc>) -> NewExperiment {
        NewExperiment {
            name: self.name.clone(),
            board_size: self.board_size,
            num_steps: self.num_steps,
            initial_config: self.initial.to_string(),
            start_time,
            rules_notation: self.rules.notation(),
            survival_rules: self.rules.survival().counts(),
            birth_rules: self.rules.birth().counts(),
        }
    }
}
