use crate::model::color::Color;
use core::fmt;
use std::str::FromStr;

/// Length of a player's chosen pattern. The game is defined for
/// three-card patterns only.
pub const PATTERN_LEN: usize = 3;

/// An ordered run of three card colors, one player's choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pattern {
    colors: [Color; PATTERN_LEN],
}

impl Pattern {
    /// Number of distinct patterns over a two-color alphabet.
    pub const COUNT: usize = 8;

    /// All patterns in index order (Red sorts before Black).
    pub const ALL: [Pattern; Pattern::COUNT] = [
        Pattern::new([Color::Red, Color::Red, Color::Red]),
        Pattern::new([Color::Red, Color::Red, Color::Black]),
        Pattern::new([Color::Red, Color::Black, Color::Red]),
        Pattern::new([Color::Red, Color::Black, Color::Black]),
        Pattern::new([Color::Black, Color::Red, Color::Red]),
        Pattern::new([Color::Black, Color::Red, Color::Black]),
        Pattern::new([Color::Black, Color::Black, Color::Red]),
        Pattern::new([Color::Black, Color::Black, Color::Black]),
    ];

    pub const fn new(colors: [Color; PATTERN_LEN]) -> Self {
        Self { colors }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Stable 0..8 index, first color most significant.
    pub fn index(self) -> usize {
        self.colors
            .iter()
            .fold(0, |acc, color| acc * 2 + color.index())
    }

    pub const fn colors(&self) -> &[Color; PATTERN_LEN] {
        &self.colors
    }

    /// Whether a three-card window equals this pattern.
    pub fn matches(&self, window: &[Color]) -> bool {
        window == self.colors
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in &self.colors {
            write!(f, "{color}")?;
        }
        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = PatternParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut colors = [Color::Red; PATTERN_LEN];
        let mut count = 0;
        for c in s.chars() {
            if count == PATTERN_LEN {
                return Err(PatternParseError::WrongLength(s.chars().count()));
            }
            colors[count] = Color::from_char(c).ok_or(PatternParseError::BadSymbol(c))?;
            count += 1;
        }
        if count != PATTERN_LEN {
            return Err(PatternParseError::WrongLength(count));
        }
        Ok(Pattern::new(colors))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternParseError {
    WrongLength(usize),
    BadSymbol(char),
}

impl fmt::Display for PatternParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternParseError::WrongLength(len) => {
                write!(f, "pattern must contain exactly {PATTERN_LEN} symbols, got {len}")
            }
            PatternParseError::BadSymbol(c) => {
                write!(f, "unknown color symbol '{c}' (expected 'R' or 'B')")
            }
        }
    }
}

impl std::error::Error for PatternParseError {}
