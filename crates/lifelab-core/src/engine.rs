//! The rule engine: one pure step from a board to its successor.
//!
//! Neighbors are the 8 cells of the Moore neighborhood. The grid is
//! bounded, not toroidal: neighbors that would fall outside the grid are
//! dead. No state is kept between calls, so the same board and rules
//! always produce the same successor.

use crate::board::Board;
use crate::rules::RuleSet;

/// Offsets of the 8 Moore neighbors.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Count live Moore neighbors of `(row, col)`, treating off-grid cells as dead.
pub fn live_neighbors(board: &Board, row: usize, col: usize) -> u8 {
    let mut count: u8 = 0;
    for (dr, dc) in NEIGHBOR_OFFSETS {
        let alive = row
            .checked_add_signed(dr)
            .zip(col.checked_add_signed(dc))
            .is_some_and(|(r, c)| board.is_alive(r, c));
        if alive {
            count = count.saturating_add(1);
        }
    }
    count
}

/// Compute the next generation of `board` under `rules`.
///
/// The result has the same dimensions. A live cell survives iff its
/// live-neighbor count is a survival count; a dead cell is born iff its
/// count is a birth count; every other cell is dead.
pub fn next_generation(board: &Board, rules: &RuleSet) -> Board {
    board.map_cells(|row, col| {
        let neighbors = live_neighbors(board, row, col);
        if board.is_alive(row, col) {
            rules.survives(neighbors)
        } else {
            rules.is_born(neighbors)
        }
    })
}

/// Iterator over successive generations, starting with the initial board.
///
/// The first item is generation 0 (the board passed in); each following
/// item is computed from the previous one. The iterator never ends; bound
/// it with `take` or `zip`.
#[derive(Debug, Clone)]
pub struct Generations {
    current: Board,
    rules: RuleSet,
    started: bool,
}

impl Generations {
    /// Start iterating from `initial` under `rules`.
    pub const fn new(initial: Board, rules: RuleSet) -> Self {
        Self {
            current: initial,
            rules,
            started: false,
        }
    }
}

impl Iterator for Generations {
    type Item = Board;

    fn next(&mut self) -> Option<Board> {
        if self.started {
            self.current = next_generation(&self.current, &self.rules);
        } else {
            self.started = true;
        }
        Some(self.current.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::codec::{decode, encode};

    fn conway() -> RuleSet {
        RuleSet::conway()
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let horizontal = decode("0000000000011100000000000", 5).unwrap();
        let vertical = next_generation(&horizontal, &conway());
        assert_eq!(encode(&vertical), "0000000100001000010000000");
        assert_eq!(next_generation(&vertical, &conway()), horizontal);
    }

    #[test]
    fn lone_cell_dies_and_size_is_kept() {
        let lone = decode("000010000", 3).unwrap();
        let next = next_generation(&lone, &conway());
        assert_eq!(next.size(), 3);
        assert_eq!(encode(&next), "000000000");
        assert_ne!(next, lone);
    }

    #[test]
    fn block_is_a_still_life() {
        let block = decode("0000011001100000", 4).unwrap();
        assert_eq!(next_generation(&block, &conway()), block);
    }

    #[test]
    fn cross_pattern_on_three_by_three_is_stable() {
        // 0 1 0
        // 1 0 1
        // 0 1 0
        // Each live cell has 2 live neighbors. The dead center has 4 and
        // the dead corners 2, so nothing is born and nothing dies.
        let board = decode("010101010", 3).unwrap();
        assert_eq!(board.live_count(), 4);
        let next = next_generation(&board, &conway());
        assert_eq!(encode(&next), "010101010");
    }

    #[test]
    fn three_by_three_blinker_flips() {
        let board = decode("000111000", 3).unwrap();
        let next = next_generation(&board, &conway());
        assert_eq!(encode(&next), "010010010");
        assert_eq!(next.live_count(), 3);
    }

    #[test]
    fn edges_are_dead_not_wrapped() {
        // Full 3x3 board. Bounded: corners see 3 neighbors and survive,
        // edge midpoints see 5 and the center 8, so they die. A toroidal
        // grid would give every cell 8 neighbors and kill them all.
        let full = decode("111111111", 3).unwrap();
        let next = next_generation(&full, &conway());
        assert_eq!(encode(&next), "101000101");
    }

    #[test]
    fn corner_neighbor_counts() {
        let full = decode("1111", 2).unwrap();
        assert_eq!(live_neighbors(&full, 0, 0), 3);
        assert_eq!(live_neighbors(&full, 1, 1), 3);
        let lone = decode("100000000", 3).unwrap();
        assert_eq!(live_neighbors(&lone, 1, 1), 1);
        assert_eq!(live_neighbors(&lone, 0, 0), 0);
    }

    #[test]
    fn birth_rules_are_honored() {
        // B1/S: every dead cell next to a live one is born, live cells die.
        let rules = RuleSet::parse("B1/S").unwrap();
        let lone = decode("000010000", 3).unwrap();
        let next = next_generation(&lone, &rules);
        assert_eq!(encode(&next), "111101111");
    }

    #[test]
    fn generations_start_with_the_initial_board() {
        let initial = decode("000111000", 3).unwrap();
        let boards: Vec<Board> = Generations::new(initial.clone(), conway()).take(3).collect();
        assert_eq!(boards.len(), 3);
        assert_eq!(boards.first(), Some(&initial));
        assert_eq!(boards.get(2), Some(&initial));
        assert_eq!(encode(boards.get(1).unwrap()), "010010010");
    }

    fn any_board() -> impl Strategy<Value = Board> {
        (1usize..10).prop_flat_map(|size| {
            prop::collection::vec(any::<bool>(), size * size)
                .prop_map(move |cells| Board::from_cells(size, cells).unwrap())
        })
    }

    proptest! {
        #[test]
        fn stepping_is_deterministic(board in any_board(), birth in 0u16..512, survival in 0u16..512) {
            let rules = RuleSet::new(
                (0..=8u8).filter(|c| birth & (1u16 << *c) != 0).collect(),
                (0..=8u8).filter(|c| survival & (1u16 << *c) != 0).collect(),
            );
            let twice = next_generation(&next_generation(&board, &rules), &rules);
            let via_iterator = Generations::new(board.clone(), rules).nth(2).unwrap();
            prop_assert_eq!(&twice, &via_iterator);
            prop_assert_eq!(next_generation(&board, &rules), next_generation(&board, &rules));
            prop_assert_eq!(twice.size(), board.size());
        }
    }
}
