use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Red, Color::Black];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Color::Red),
            1 => Some(Color::Black),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> Self {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'R' => Some(Color::Red),
            'B' => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Color::Red => "R",
            Color::Black => "B",
        };
        f.write_str(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn display_returns_ascii_symbols() {
        assert_eq!(Color::Red.to_string(), "R");
        assert_eq!(Color::Black.to_string(), "B");
    }

    #[test]
    fn from_index_maps_valid_values() {
        assert_eq!(Color::from_index(0), Some(Color::Red));
        assert_eq!(Color::from_index(1), Some(Color::Black));
        assert_eq!(Color::from_index(2), None);
    }

    #[test]
    fn other_flips_the_color() {
        assert_eq!(Color::Red.other(), Color::Black);
        assert_eq!(Color::Black.other(), Color::Red);
    }

    #[test]
    fn from_char_rejects_unknown_symbols() {
        assert_eq!(Color::from_char('R'), Some(Color::Red));
        assert_eq!(Color::from_char('B'), Some(Color::Black));
        assert_eq!(Color::from_char('X'), None);
    }
}
