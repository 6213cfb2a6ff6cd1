use crate::model::pattern::Pattern;
use core::fmt;

/// Ordered pairs of distinct patterns: 8 × 7.
pub const COMBO_COUNT: usize = 56;

/// One matchup: my chosen pattern against the opponent's. The roles
/// are not interchangeable; (a, b) and (b, a) are distinct pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerPair {
    mine: Pattern,
    theirs: Pattern,
}

impl PlayerPair {
    pub fn new(mine: Pattern, theirs: Pattern) -> Result<Self, PairError> {
        if mine == theirs {
            return Err(PairError::SamePattern(mine));
        }
        Ok(Self { mine, theirs })
    }

    pub const fn mine(&self) -> Pattern {
        self.mine
    }

    pub const fn theirs(&self) -> Pattern {
        self.theirs
    }
}

impl fmt::Display for PlayerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.mine, self.theirs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairError {
    SamePattern(Pattern),
}

impl fmt::Display for PairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairError::SamePattern(pattern) => {
                write!(f, "both players chose the same pattern {pattern}")
            }
        }
    }
}

impl std::error::Error for PairError {}

/// The full enumeration of all 56 ordered pairs of distinct patterns,
/// built once and indexed thereafter. Enumeration order is stable:
/// outer loop over my pattern, inner loop over the opponent's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboSet {
    pairs: Vec<PlayerPair>,
}

impl ComboSet {
    pub fn standard() -> Self {
        let mut pairs = Vec::with_capacity(COMBO_COUNT);
        for mine in Pattern::ALL {
            for theirs in Pattern::ALL {
                if mine != theirs {
                    pairs.push(PlayerPair { mine, theirs });
                }
            }
        }
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[PlayerPair] {
        &self.pairs
    }

    pub fn get(&self, index: usize) -> Option<PlayerPair> {
        self.pairs.get(index).copied()
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: Vec<PlayerPair>) -> Self {
        Self { pairs }
    }

    /// Index of a pair in enumeration order, matched by identity.
    pub fn index_of(&self, pair: PlayerPair) -> Option<usize> {
        let mine = pair.mine.index();
        let theirs = pair.theirs.index();
        let offset = if theirs > mine { theirs - 1 } else { theirs };
        let index = mine * (Pattern::COUNT - 1) + offset;
        (self.pairs.get(index) == Some(&pair)).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::{COMBO_COUNT, ComboSet, PairError, PlayerPair};
    use crate::model::pattern::Pattern;

    #[test]
    fn standard_set_enumerates_56_distinct_pairs() {
        let combos = ComboSet::standard();
        assert_eq!(combos.len(), COMBO_COUNT);

        let mut seen = combos.pairs().to_vec();
        seen.sort_by_key(|pair| (pair.mine().index(), pair.theirs().index()));
        seen.dedup();
        assert_eq!(seen.len(), COMBO_COUNT);

        for pair in combos.pairs() {
            assert_ne!(pair.mine(), pair.theirs());
        }
    }

    #[test]
    fn index_of_agrees_with_enumeration_order() {
        let combos = ComboSet::standard();
        for (position, pair) in combos.pairs().iter().enumerate() {
            assert_eq!(combos.index_of(*pair), Some(position));
        }
    }

    #[test]
    fn pair_rejects_duplicate_patterns() {
        let pattern = Pattern::from_index(0).unwrap();
        assert_eq!(
            PlayerPair::new(pattern, pattern),
            Err(PairError::SamePattern(pattern))
        );
    }

    #[test]
    fn reversed_pairs_are_distinct_entries() {
        let combos = ComboSet::standard();
        let a = Pattern::from_index(0).unwrap();
        let b = Pattern::from_index(7).unwrap();
        let forward = PlayerPair::new(a, b).unwrap();
        let reverse = PlayerPair::new(b, a).unwrap();
        assert_ne!(combos.index_of(forward), combos.index_of(reverse));
        assert!(combos.index_of(forward).is_some());
        assert!(combos.index_of(reverse).is_some());
    }
}
