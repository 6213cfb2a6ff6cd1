use crate::model::deck::Deck;
use crate::model::pair::{ComboSet, PlayerPair};
use crate::model::pattern::PATTERN_LEN;
use serde::Serialize;

/// Trick and card counts for one deck scored against one pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeckScore {
    pub tricks_mine: u32,
    pub cards_mine: u32,
    pub tricks_theirs: u32,
    pub cards_theirs: u32,
}

/// Score one deck against one pair in a single left-to-right pass.
///
/// A matched window resolves a trick: the matching side collects one
/// trick plus `cards_to_win` cards (the gap since the last trick plus
/// three), and the scan skips past the matched window. An unmatched
/// window slides by one card and grows the pot by one. Cards left in
/// an unmatched tail are awarded to nobody.
pub fn score_deck(deck: &Deck, pair: PlayerPair) -> DeckScore {
    let cards = deck.cards();
    let mut score = DeckScore::default();
    let mut i = 0;
    let mut cards_to_win = PATTERN_LEN as u32;

    while i + PATTERN_LEN <= cards.len() {
        let window = &cards[i..i + PATTERN_LEN];
        if pair.mine().matches(window) {
            score.tricks_mine += 1;
            score.cards_mine += cards_to_win;
            i += PATTERN_LEN;
            cards_to_win = PATTERN_LEN as u32;
        } else if pair.theirs().matches(window) {
            score.tricks_theirs += 1;
            score.cards_theirs += cards_to_win;
            i += PATTERN_LEN;
            cards_to_win = PATTERN_LEN as u32;
        } else {
            i += 1;
            cards_to_win += 1;
        }
    }

    score
}

/// Score one deck against every pair in the combo set, one independent
/// scan per pair, results in enumeration order.
pub fn score_all(deck: &Deck, combos: &ComboSet) -> Vec<DeckScore> {
    combos
        .pairs()
        .iter()
        .map(|pair| score_deck(deck, *pair))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{score_all, score_deck};
    use crate::model::deck::{DECK_SIZE, Deck};
    use crate::model::pair::{ComboSet, PlayerPair};
    use crate::model::pattern::Pattern;

    fn pair(mine: &str, theirs: &str) -> PlayerPair {
        PlayerPair::new(mine.parse().unwrap(), theirs.parse().unwrap()).unwrap()
    }

    #[test]
    fn hand_computed_two_run_deck() {
        // 3 reds, 26 blacks, 23 reds. RRR resolves at 0 and then at
        // 29, 32, .., 47 after a five-card pot; BBB sweeps the black
        // run in eight non-overlapping tricks.
        let text = format!("RRR{}{}", "B".repeat(26), "R".repeat(23));
        let deck: Deck = text.parse().unwrap();
        let score = score_deck(&deck, pair("RRR", "BBB"));

        assert_eq!(score.tricks_mine, 8);
        assert_eq!(score.cards_mine, 26);
        assert_eq!(score.tricks_theirs, 8);
        assert_eq!(score.cards_theirs, 24);
    }

    #[test]
    fn scoring_is_deterministic() {
        let deck = Deck::shuffled_with_seed(99);
        let matchup = pair("RBR", "BBR");
        assert_eq!(score_deck(&deck, matchup), score_deck(&deck, matchup));
    }

    #[test]
    fn deck_without_either_pattern_scores_zero() {
        // Alternating colors never produce RRR or BBB.
        let text: String = (0..DECK_SIZE)
            .map(|i| if i % 2 == 0 { 'R' } else { 'B' })
            .collect();
        let deck: Deck = text.parse().unwrap();
        let score = score_deck(&deck, pair("RRR", "BBB"));
        assert_eq!(score, Default::default());
    }

    #[test]
    fn awarded_cards_never_exceed_the_deck() {
        let combos = ComboSet::standard();
        for seed in 0..20 {
            let deck = Deck::shuffled_with_seed(seed);
            for score in score_all(&deck, &combos) {
                let awarded = (score.cards_mine + score.cards_theirs) as usize;
                assert!(awarded <= DECK_SIZE);
                let tricks = score.tricks_mine + score.tricks_theirs;
                assert!(tricks as usize <= DECK_SIZE / 3);
                // Every trick pays out at least a full pattern.
                assert!(score.cards_mine >= score.tricks_mine * 3);
                assert!(score.cards_theirs >= score.tricks_theirs * 3);
            }
        }
    }

    #[test]
    fn trailing_remainder_accounts_for_unawarded_cards() {
        // Deck ends on a resolved trick except for a two-card tail.
        let text = format!("RRR{}{}", "B".repeat(26), "R".repeat(23));
        let deck: Deck = text.parse().unwrap();
        let score = score_deck(&deck, pair("RRR", "BBB"));
        let awarded = (score.cards_mine + score.cards_theirs) as usize;
        assert_eq!(DECK_SIZE - awarded, 2);
    }

    #[test]
    fn score_all_covers_every_pair_in_order() {
        let combos = ComboSet::standard();
        let deck = Deck::shuffled_with_seed(5);
        let scores = score_all(&deck, &combos);
        assert_eq!(scores.len(), combos.len());

        let probe = combos.pairs()[17];
        assert_eq!(scores[17], score_deck(&deck, probe));
    }

    #[test]
    fn mirrored_pair_swaps_the_score() {
        let deck = Deck::shuffled_with_seed(11);
        let forward = score_deck(&deck, pair("RRB", "BRR"));
        let reverse = score_deck(&deck, pair("BRR", "RRB"));
        assert_eq!(forward.tricks_mine, reverse.tricks_theirs);
        assert_eq!(forward.cards_mine, reverse.cards_theirs);
        assert_eq!(forward.tricks_theirs, reverse.tricks_mine);
        assert_eq!(forward.cards_theirs, reverse.cards_mine);
    }

    #[test]
    fn pattern_index_sanity() {
        assert_eq!("RRR".parse::<Pattern>().unwrap().index(), 0);
        assert_eq!("BBB".parse::<Pattern>().unwrap().index(), 7);
    }
}
