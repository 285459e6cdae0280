//! Initial board configurations.
//!
//! An experiment starts either from an explicit encoded pattern or from a
//! seeded random fill. The random fill is driven by a ChaCha8 stream so the
//! same `(density, seed)` pair yields the same board on every platform.

use core::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardError, cell_count};
use crate::codec;

/// Density used when a random fill does not specify one.
pub const DEFAULT_DENSITY: f64 = 0.5;

/// Seed used when a random fill does not specify one.
pub const DEFAULT_SEED: u64 = 0;

/// Where generation 0 comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialConfig {
    /// An explicit row-major encoded board.
    Pattern {
        /// Encoded cells, `board_size²` symbols long.
        cells: String,
    },
    /// Cells alive independently with probability `density`.
    Random {
        /// Probability in `[0, 1]` that a cell starts alive.
        density: f64,
        /// PRNG seed.
        seed: u64,
    },
}

impl InitialConfig {
    /// An explicit pattern.
    pub fn pattern(cells: impl Into<String>) -> Self {
        Self::Pattern {
            cells: cells.into(),
        }
    }

    /// A seeded random fill.
    pub const fn random(density: f64, seed: u64) -> Self {
        Self::Random { density, seed }
    }

    /// Build the generation-0 board for a `board_size` grid.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] if a pattern fails to decode or the size
    /// overflows. Densities outside `[0, 1]` are clamped; callers validate
    /// them first.
    pub fn materialize(&self, board_size: usize) -> Result<Board, BoardError> {
        match self {
            Self::Pattern { cells } => codec::decode(cells, board_size),
            Self::Random { density, seed } => {
                let len = cell_count(board_size)?;
                let p = if density.is_nan() {
                    0.0
                } else {
                    density.clamp(0.0, 1.0)
                };
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                let cells = (0..len).map(|_| rng.random_bool(p)).collect();
                Board::from_cells(board_size, cells)
            }
        }
    }
}

/// Renders the descriptor persisted in `experiments.initial_config`.
///
/// Patterns render as their encoded cells; random fills render as
/// `random:density=D;seed=S`.
impl fmt::Display for InitialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { cells } => f.write_str(cells),
            Self::Random { density, seed } => write!(f, "random:density={density};seed={seed}"),
        }
    }
}

/// Fallbacks for the random generator when a request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedDefaults {
    /// Density when none is given.
    pub density: f64,
    /// Seed when none is given.
    pub seed: u64,
}

impl SeedDefaults {
    /// A random fill using these defaults.
    pub const fn config(&self) -> InitialConfig {
        InitialConfig::random(self.density, self.seed)
    }
}

impl Default for SeedDefaults {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            seed: DEFAULT_SEED,
        }
    }
}
