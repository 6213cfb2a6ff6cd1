use crate::model::color::Color;
use core::fmt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::str::FromStr;

/// Cards in a deck.
pub const DECK_SIZE: usize = 52;

/// Cards of each color in a deck.
pub const CARDS_PER_COLOR: usize = 26;

/// A full game deck: 52 cards, exactly 26 of each color, immutable
/// once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Color>,
}

impl Deck {
    /// The unshuffled deck: 26 red cards followed by 26 black cards.
    pub fn balanced() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        cards.extend(std::iter::repeat(Color::Red).take(CARDS_PER_COLOR));
        cards.extend(std::iter::repeat(Color::Black).take(CARDS_PER_COLOR));
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::balanced();
        deck.cards.shuffle(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    /// Build a deck from externally supplied cards, enforcing the
    /// 52-card, 26/26 invariant.
    pub fn from_cards(cards: Vec<Color>) -> Result<Self, DeckError> {
        if cards.len() != DECK_SIZE {
            return Err(DeckError::WrongLength(cards.len()));
        }
        let red = cards.iter().filter(|c| **c == Color::Red).count();
        if red != CARDS_PER_COLOR {
            return Err(DeckError::Unbalanced {
                red,
                black: DECK_SIZE - red,
            });
        }
        Ok(Self { cards })
    }

    pub fn cards(&self) -> &[Color] {
        &self.cards
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in &self.cards {
            write!(f, "{card}")?;
        }
        Ok(())
    }
}

impl FromStr for Deck {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cards = s
            .chars()
            .map(|c| Color::from_char(c).ok_or(DeckError::BadSymbol(c)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_cards(cards)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckError {
    WrongLength(usize),
    Unbalanced { red: usize, black: usize },
    BadSymbol(char),
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckError::WrongLength(len) => {
                write!(f, "deck must contain exactly {DECK_SIZE} cards, got {len}")
            }
            DeckError::Unbalanced { red, black } => {
                write!(
                    f,
                    "deck must contain {CARDS_PER_COLOR} cards of each color, got {red} red / {black} black"
                )
            }
            DeckError::BadSymbol(c) => {
                write!(f, "unknown color symbol '{c}' (expected 'R' or 'B')")
            }
        }
    }
}

impl std::error::Error for DeckError {}

#[cfg(test)]
mod tests {
    use super::{CARDS_PER_COLOR, DECK_SIZE, Deck, DeckError};
    use crate::model::color::Color;

    #[test]
    fn balanced_deck_holds_26_of_each_color() {
        let deck = Deck::balanced();
        assert_eq!(deck.cards().len(), DECK_SIZE);
        let red = deck.cards().iter().filter(|c| **c == Color::Red).count();
        assert_eq!(red, CARDS_PER_COLOR);
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let deck_a = Deck::shuffled_with_seed(42);
        let deck_b = Deck::shuffled_with_seed(42);
        assert_eq!(deck_a, deck_b);
    }

    #[test]
    fn shuffle_with_different_seeds_differs() {
        let deck_a = Deck::shuffled_with_seed(1);
        let deck_b = Deck::shuffled_with_seed(2);
        assert_ne!(deck_a, deck_b);
    }

    #[test]
    fn shuffle_preserves_the_balance_invariant() {
        let deck = Deck::shuffled_with_seed(7);
        let red = deck.cards().iter().filter(|c| **c == Color::Red).count();
        assert_eq!(red, CARDS_PER_COLOR);
    }

    #[test]
    fn from_cards_rejects_wrong_length() {
        let err = Deck::from_cards(vec![Color::Red; 10]).unwrap_err();
        assert_eq!(err, DeckError::WrongLength(10));
    }

    #[test]
    fn from_cards_rejects_unbalanced_decks() {
        let err = Deck::from_cards(vec![Color::Red; DECK_SIZE]).unwrap_err();
        assert_eq!(err, DeckError::Unbalanced { red: 52, black: 0 });
    }

    #[test]
    fn display_and_parse_round_trip() {
        let deck = Deck::shuffled_with_seed(3);
        let text = deck.to_string();
        assert_eq!(text.len(), DECK_SIZE);
        let parsed: Deck = text.parse().unwrap();
        assert_eq!(parsed, deck);
    }

    #[test]
    fn parse_rejects_unknown_symbols() {
        let mut text = Deck::balanced().to_string();
        text.replace_range(0..1, "Z");
        assert_eq!(text.parse::<Deck>(), Err(DeckError::BadSymbol('Z')));
    }
}
