//! The square, bounded cell grid that experiments evolve.
//!
//! Cells are stored row-major. Any coordinate outside the grid reads as
//! dead, which is exactly the bounded edge policy the rule engine applies.

/// Errors describing an unusable board or board encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// Cell count does not equal `board_size * board_size`.
    #[error("malformed board: expected {expected} cells, got {actual}")]
    Malformed {
        /// `board_size * board_size`.
        expected: usize,
        /// Cells actually supplied.
        actual: usize,
    },

    /// An encoded board contained a character other than the alive/dead symbols.
    #[error("malformed board: invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol {
        /// Zero-based row-major cell position.
        position: usize,
        /// The offending character.
        symbol: char,
    },

    /// `board_size * board_size` does not fit in memory-addressable range.
    #[error("malformed board: size {size} is too large")]
    TooLarge {
        /// Requested side length.
        size: usize,
    },

    /// The counted live cells disagree with the alive symbols in the encoding.
    #[error("live cell count {counted} disagrees with {encoded} alive symbols in encoding")]
    LiveCountMismatch {
        /// Live cells counted on the grid.
        counted: usize,
        /// Alive symbols counted in the encoded string.
        encoded: usize,
    },
}

/// A `size x size` grid of alive/dead cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<bool>,
}

impl Board {
    /// An all-dead board.
    pub fn empty(size: usize) -> Result<Self, BoardError> {
        let len = cell_count(size)?;
        Ok(Self {
            size,
            cells: vec![false; len],
        })
    }

    /// Build a board from row-major cells.
    pub fn from_cells(size: usize, cells: Vec<bool>) -> Result<Self, BoardError> {
        let expected = cell_count(size)?;
        if cells.len() != expected {
            return Err(BoardError::Malformed {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { size, cells })
    }

    /// Side length.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Row-major cells.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Whether the cell at `(row, col)` is alive. Off-grid cells are dead.
    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        self.index(row, col)
            .and_then(|i| self.cells.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Number of live cells.
    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|alive| **alive).count()
    }

    /// A board of the same size whose cell `(row, col)` is `alive(row, col)`.
    pub(crate) fn map_cells<F>(&self, mut alive: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut cells = Vec::with_capacity(self.cells.len());
        for row in 0..self.size {
            for col in 0..self.size {
                cells.push(alive(row, col));
            }
        }
        Self {
            size: self.size,
            cells,
        }
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.size || col >= self.size {
            return None;
        }
        row.checked_mul(self.size)?.checked_add(col)
    }
}

/// `size * size`, or [`BoardError::TooLarge`] on overflow.
pub(crate) fn cell_count(size: usize) -> Result<usize, BoardError> {
    size.checked_mul(size).ok_or(BoardError::TooLarge { size })
}
