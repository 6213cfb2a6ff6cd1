use crate::model::deck::Deck;
use crate::model::pair::{ComboSet, PlayerPair};
use crate::score::outcome::{DeckOutcome, Verdict};
use crate::score::scorer::score_deck;
use core::fmt;
use serde::Serialize;

/// Cumulative win/draw counters for one pair, one unit per scored deck
/// and per metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WinRecord {
    pub wins_mine_tricks: u64,
    pub wins_theirs_tricks: u64,
    pub draws_tricks: u64,
    pub wins_mine_cards: u64,
    pub wins_theirs_cards: u64,
    pub draws_cards: u64,
}

impl WinRecord {
    pub fn absorb(&mut self, outcome: DeckOutcome) {
        match outcome.tricks {
            Verdict::WinMine => self.wins_mine_tricks += 1,
            Verdict::WinTheirs => self.wins_theirs_tricks += 1,
            Verdict::Draw => self.draws_tricks += 1,
        }
        match outcome.cards {
            Verdict::WinMine => self.wins_mine_cards += 1,
            Verdict::WinTheirs => self.wins_theirs_cards += 1,
            Verdict::Draw => self.draws_cards += 1,
        }
    }

    pub fn tricks_total(&self) -> u64 {
        self.wins_mine_tricks + self.wins_theirs_tricks + self.draws_tricks
    }

    pub fn cards_total(&self) -> u64 {
        self.wins_mine_cards + self.wins_theirs_cards + self.draws_cards
    }
}

/// The cumulative results table: one record per combo-set entry, in
/// enumeration order, plus the count of decks folded in so far.
///
/// Every record's counters sum to `decks_scored` per metric; that
/// invariant is enforced when a persisted table is rebuilt and may be
/// re-checked at any commit point.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsTable {
    combos: ComboSet,
    records: Vec<WinRecord>,
    decks_scored: u64,
}

impl ResultsTable {
    pub fn blank(combos: ComboSet) -> Self {
        let records = vec![WinRecord::default(); combos.len()];
        Self {
            combos,
            records,
            decks_scored: 0,
        }
    }

    /// Rebuild a table from persisted parts, validating record count
    /// and the per-record sum invariant against the deck count.
    pub fn from_parts(
        combos: ComboSet,
        records: Vec<WinRecord>,
        decks_scored: u64,
    ) -> Result<Self, TallyError> {
        if records.len() != combos.len() {
            return Err(TallyError::RecordCount {
                expected: combos.len(),
                found: records.len(),
            });
        }
        let table = Self {
            combos,
            records,
            decks_scored,
        };
        table.check_invariant()?;
        Ok(table)
    }

    pub fn combos(&self) -> &ComboSet {
        &self.combos
    }

    pub fn records(&self) -> &[WinRecord] {
        &self.records
    }

    pub fn decks_scored(&self) -> u64 {
        self.decks_scored
    }

    pub fn record(&self, pair: PlayerPair) -> Option<&WinRecord> {
        self.combos.index_of(pair).map(|index| &self.records[index])
    }

    /// Merge one deck's outcome for one pair. The pair must exist in
    /// the combo set; an unknown pair signals an enumeration bug and
    /// fails rather than dropping the increment.
    pub fn absorb_outcome(
        &mut self,
        pair: PlayerPair,
        outcome: DeckOutcome,
    ) -> Result<(), TallyError> {
        let index = self
            .combos
            .index_of(pair)
            .ok_or(TallyError::UnknownPair(pair))?;
        self.records[index].absorb(outcome);
        Ok(())
    }

    /// Score one deck against every pair and fold the outcomes in.
    /// Exactly one increment per pair per metric, then the deck count
    /// advances once.
    pub fn absorb_deck(&mut self, deck: &Deck) {
        for index in 0..self.records.len() {
            let pair = self.combos.pairs()[index];
            let outcome = score_deck(deck, pair).classify();
            self.records[index].absorb(outcome);
        }
        self.decks_scored += 1;
    }

    /// Verify that every record's counters sum to the deck count for
    /// both metrics.
    pub fn check_invariant(&self) -> Result<(), TallyError> {
        for (index, record) in self.records.iter().enumerate() {
            let pair = self.combos.pairs()[index];
            if record.tricks_total() != self.decks_scored {
                return Err(TallyError::OffBalance {
                    pair,
                    metric: "tricks",
                    total: record.tricks_total(),
                    expected: self.decks_scored,
                });
            }
            if record.cards_total() != self.decks_scored {
                return Err(TallyError::OffBalance {
                    pair,
                    metric: "cards",
                    total: record.cards_total(),
                    expected: self.decks_scored,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyError {
    UnknownPair(PlayerPair),
    RecordCount {
        expected: usize,
        found: usize,
    },
    OffBalance {
        pair: PlayerPair,
        metric: &'static str,
        total: u64,
        expected: u64,
    },
}

impl fmt::Display for TallyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TallyError::UnknownPair(pair) => {
                write!(f, "pair {pair} is not part of the combo set")
            }
            TallyError::RecordCount { expected, found } => {
                write!(f, "expected {expected} win records, found {found}")
            }
            TallyError::OffBalance {
                pair,
                metric,
                total,
                expected,
            } => {
                write!(
                    f,
                    "{metric} counters for {pair} sum to {total} but {expected} decks were scored"
                )
            }
        }
    }
}

impl std::error::Error for TallyError {}

#[cfg(test)]
mod tests {
    use super::{ResultsTable, TallyError, WinRecord};
    use crate::model::deck::Deck;
    use crate::model::pair::{COMBO_COUNT, ComboSet, PlayerPair};
    use crate::score::outcome::{DeckOutcome, Verdict};

    #[test]
    fn blank_table_is_all_zero() {
        let table = ResultsTable::blank(ComboSet::standard());
        assert_eq!(table.records().len(), COMBO_COUNT);
        assert_eq!(table.decks_scored(), 0);
        assert!(table.records().iter().all(|r| *r == WinRecord::default()));
        table.check_invariant().unwrap();
    }

    #[test]
    fn absorbing_decks_keeps_the_sum_invariant() {
        let mut table = ResultsTable::blank(ComboSet::standard());
        for seed in 0..25 {
            table.absorb_deck(&Deck::shuffled_with_seed(seed));
        }
        assert_eq!(table.decks_scored(), 25);
        table.check_invariant().unwrap();
    }

    #[test]
    fn aggregation_is_order_independent() {
        let decks: Vec<Deck> = (0..10).map(Deck::shuffled_with_seed).collect();

        let mut forward = ResultsTable::blank(ComboSet::standard());
        for deck in &decks {
            forward.absorb_deck(deck);
        }

        let mut backward = ResultsTable::blank(ComboSet::standard());
        for deck in decks.iter().rev() {
            backward.absorb_deck(deck);
        }

        assert_eq!(forward, backward);
    }

    #[test]
    fn unknown_pair_fails_the_merge() {
        let standard = ComboSet::standard();
        let known = standard.pairs()[0];
        let stranger = standard.pairs()[10];

        let subset = ComboSet::from_pairs(vec![known]);
        let mut table =
            ResultsTable::from_parts(subset, vec![WinRecord::default()], 0).unwrap();

        let outcome = DeckOutcome {
            tricks: Verdict::Draw,
            cards: Verdict::Draw,
        };
        table.absorb_outcome(known, outcome).unwrap();
        assert_eq!(
            table.absorb_outcome(stranger, outcome),
            Err(TallyError::UnknownPair(stranger))
        );
    }

    #[test]
    fn from_parts_rejects_wrong_record_count() {
        let err = ResultsTable::from_parts(ComboSet::standard(), Vec::new(), 0).unwrap_err();
        assert_eq!(
            err,
            TallyError::RecordCount {
                expected: COMBO_COUNT,
                found: 0
            }
        );
    }

    #[test]
    fn from_parts_rejects_off_balance_records() {
        let mut records = vec![WinRecord::default(); COMBO_COUNT];
        records[3].wins_mine_tricks = 1;
        let err = ResultsTable::from_parts(ComboSet::standard(), records, 0).unwrap_err();
        assert!(matches!(
            err,
            TallyError::OffBalance {
                metric: "tricks",
                total: 1,
                expected: 0,
                ..
            }
        ));
    }

    #[test]
    fn win_record_serializes_with_named_counters() {
        let record = WinRecord {
            wins_mine_tricks: 2,
            draws_cards: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["wins_mine_tricks"], 2);
        assert_eq!(json["draws_cards"], 1);
        assert_eq!(json["wins_theirs_cards"], 0);
    }

    #[test]
    fn record_lookup_matches_by_pair_identity() {
        let mut table = ResultsTable::blank(ComboSet::standard());
        let deck = Deck::shuffled_with_seed(1);
        table.absorb_deck(&deck);

        let pair = PlayerPair::new("RRB".parse().unwrap(), "BBR".parse().unwrap()).unwrap();
        let record = table.record(pair).unwrap();
        assert_eq!(record.tricks_total(), 1);
        assert_eq!(record.cards_total(), 1);
    }
}
