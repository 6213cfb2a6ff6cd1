use crate::score::scorer::DeckScore;

/// Who took one deck, for a single metric. Strict greater-than wins;
/// equality is a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    WinMine,
    WinTheirs,
    Draw,
}

impl Verdict {
    pub fn from_counts(mine: u32, theirs: u32) -> Self {
        if mine > theirs {
            Verdict::WinMine
        } else if mine < theirs {
            Verdict::WinTheirs
        } else {
            Verdict::Draw
        }
    }
}

/// A deck's classified result for one pair. The trick and card
/// verdicts are independent metrics and may disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckOutcome {
    pub tricks: Verdict,
    pub cards: Verdict,
}

impl DeckScore {
    pub fn classify(self) -> DeckOutcome {
        DeckOutcome {
            tricks: Verdict::from_counts(self.tricks_mine, self.tricks_theirs),
            cards: Verdict::from_counts(self.cards_mine, self.cards_theirs),
        }
    }
}
