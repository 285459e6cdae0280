//! Birth/survival rule sets and their `B<digits>/S<digits>` notation.
//!
//! A [`RuleSet`] is parsed once at the experiment boundary and then
//! consulted for every cell of every generation, so it is stored as two
//! 9-bit masks (one bit per neighbor count 0-8) and membership checks are
//! a single shift.

use core::fmt;
use core::str::FromStr;

/// Highest neighbor count in a Moore neighborhood.
pub const MAX_NEIGHBORS: u8 = 8;

/// Notation for Conway's Game of Life.
pub const CONWAY_NOTATION: &str = "B3/S23";

/// Errors produced while parsing rule notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// The notation does not follow `B<digits>/S<digits>`.
    #[error("invalid rule notation {notation:?}: {reason}")]
    InvalidRuleNotation {
        /// The rejected input.
        notation: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// A set of neighbor counts in `0..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NeighborSet(u16);

impl NeighborSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Whether `count` is a member. Counts above 8 never are.
    pub const fn contains(self, count: u8) -> bool {
        count <= MAX_NEIGHBORS && self.0 & (1 << count) != 0
    }

    /// Return a copy with `count` added. Counts above 8 are ignored.
    #[must_use]
    pub const fn with(self, count: u8) -> Self {
        if count > MAX_NEIGHBORS {
            self
        } else {
            Self(self.0 | (1 << count))
        }
    }

    /// Members in ascending order.
    pub fn counts(self) -> Vec<u8> {
        (0..=MAX_NEIGHBORS).filter(|c| self.contains(*c)).collect()
    }
}

impl FromIterator<u8> for NeighborSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for NeighborSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for count in self.counts() {
            write!(f, "{count}")?;
        }
        Ok(())
    }
}

/// A typed, pre-validated outer-totalistic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleSet {
    birth: NeighborSet,
    survival: NeighborSet,
}

impl RuleSet {
    /// Build a rule set from explicit birth and survival sets.
    pub const fn new(birth: NeighborSet, survival: NeighborSet) -> Self {
        Self { birth, survival }
    }

    /// Conway's Game of Life, `B3/S23`.
    pub const fn conway() -> Self {
        Self::new(
            NeighborSet::EMPTY.with(3),
            NeighborSet::EMPTY.with(2).with(3),
        )
    }

    /// Parse `B<digits>/S<digits>`.
    ///
    /// The grammar is strict: upper-case `B` and `S`, digits `0`-`8`, a
    /// single `/`, no whitespace. Either digit list may be empty and
    /// repeated digits are accepted.
    pub fn parse(notation: &str) -> Result<Self, RuleError> {
        let invalid = |reason: &str| RuleError::InvalidRuleNotation {
            notation: notation.to_owned(),
            reason: reason.to_owned(),
        };

        let (birth_part, survival_part) = notation
            .split_once('/')
            .ok_or_else(|| invalid("missing '/' separator"))?;
        let birth_digits = birth_part
            .strip_prefix('B')
            .ok_or_else(|| invalid("birth part must start with 'B'"))?;
        let survival_digits = survival_part
            .strip_prefix('S')
            .ok_or_else(|| invalid("survival part must start with 'S'"))?;

        let birth = parse_digits(birth_digits).map_err(|c| invalid(&bad_digit(c)))?;
        let survival = parse_digits(survival_digits).map_err(|c| invalid(&bad_digit(c)))?;

        Ok(Self { birth, survival })
    }

    /// Whether a dead cell with `live_neighbors` comes to life.
    pub const fn is_born(&self, live_neighbors: u8) -> bool {
        self.birth.contains(live_neighbors)
    }

    /// Whether a live cell with `live_neighbors` stays alive.
    pub const fn survives(&self, live_neighbors: u8) -> bool {
        self.survival.contains(live_neighbors)
    }

    /// The birth neighbor counts.
    pub const fn birth(&self) -> NeighborSet {
        self.birth
    }

    /// The survival neighbor counts.
    pub const fn survival(&self) -> NeighborSet {
        self.survival
    }

    /// Canonical notation: digits sorted and de-duplicated.
    pub fn notation(&self) -> String {
        self.to_string()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::conway()
    }
}

impl FromStr for RuleSet {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}/S{}", self.birth, self.survival)
    }
}

/// Collect a run of `0`-`8` digits, returning the first offending char.
fn parse_digits(digits: &str) -> Result<NeighborSet, char> {
    digits.chars().try_fold(NeighborSet::EMPTY, |set, c| {
        c.to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .filter(|d| *d <= MAX_NEIGHBORS)
            .map(|d| set.with(d))
            .ok_or(c)
    })
}

fn bad_digit(c: char) -> String {
    format!("unexpected {c:?}, expected a neighbor count 0-8")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_conway() {
        let rules = RuleSet::parse(CONWAY_NOTATION).unwrap();
        assert_eq!(rules, RuleSet::conway());
        assert!(rules.is_born(3));
        assert!(!rules.is_born(2));
        assert!(rules.survives(2));
        assert!(rules.survives(3));
        assert!(!rules.survives(4));
    }

    #[test]
    fn parses_highlife_and_empty_lists() {
        let highlife = RuleSet::parse("B36/S23").unwrap();
        assert_eq!(highlife.birth().counts(), vec![3, 6]);

        let seeds = RuleSet::parse("B2/S").unwrap();
        assert_eq!(seeds.birth().counts(), vec![2]);
        assert!(seeds.survival().counts().is_empty());

        let inert = RuleSet::parse("B/S").unwrap();
        assert_eq!(inert.notation(), "B/S");
    }

    #[test]
    fn canonical_notation_sorts_and_dedups() {
        let rules = RuleSet::parse("B33/S32").unwrap();
        assert_eq!(rules.notation(), "B3/S23");
        assert_eq!(rules.survival().counts(), vec![2, 3]);
    }

    #[test]
    fn rejects_malformed_notation() {
        for bad in [
            "", "B3S23", "S23/B3", "b3/s23", "B9/S23", "B3/S2x", " B3/S23", "B3/S23/", "B-1/S2",
        ] {
            let err = RuleSet::parse(bad).unwrap_err();
            assert!(
                matches!(err, RuleError::InvalidRuleNotation { ref notation, .. } if notation == bad),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn counts_above_eight_are_never_members() {
        let set: NeighborSet = [0, 8, 9, 200].into_iter().collect();
        assert_eq!(set.counts(), vec![0, 8]);
        assert!(!set.contains(9));
    }

    #[test]
    fn display_round_trips() {
        let rules = RuleSet::parse("B0368/S1245").unwrap();
        assert_eq!(rules.to_string().parse::<RuleSet>().unwrap(), rules);
    }
}
