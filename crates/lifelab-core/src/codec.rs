//! Fixed-width text encoding of boards.
//!
//! A board of side `n` encodes to exactly `n * n` characters, row-major,
//! one per cell: [`ALIVE`] or [`DEAD`]. Equal boards therefore produce
//! byte-identical trace rows that can be compared and diffed directly.

use crate::board::{Board, BoardError, cell_count};

/// Symbol for a live cell.
pub const ALIVE: char = '1';

/// Symbol for a dead cell.
pub const DEAD: char = '0';

/// Encode a board as a row-major string of [`ALIVE`]/[`DEAD`] symbols.
pub fn encode(board: &Board) -> String {
    board
        .cells()
        .iter()
        .map(|alive| if *alive { ALIVE } else { DEAD })
        .collect()
}

/// Decode a row-major string into a `board_size x board_size` board.
///
/// Rejects input whose length is not `board_size²` or that contains any
/// symbol other than [`ALIVE`] and [`DEAD`].
pub fn decode(encoded: &str, board_size: usize) -> Result<Board, BoardError> {
    let expected = cell_count(board_size)?;
    let actual = encoded.chars().count();
    if actual != expected {
        return Err(BoardError::Malformed { expected, actual });
    }

    let cells = encoded
        .chars()
        .enumerate()
        .map(|(position, symbol)| match symbol {
            ALIVE => Ok(true),
            DEAD => Ok(false),
            _ => Err(BoardError::InvalidSymbol { position, symbol }),
        })
        .collect::<Result<Vec<bool>, BoardError>>()?;

    Board::from_cells(board_size, cells)
}

/// Number of live cells on the board.
pub fn count_live(board: &Board) -> usize {
    board.live_count()
}

/// Number of [`ALIVE`] symbols in an encoded board.
pub fn count_alive_symbols(encoded: &str) -> usize {
    encoded.chars().filter(|c| *c == ALIVE).count()
}
