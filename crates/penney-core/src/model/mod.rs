pub mod color;
pub mod deck;
pub mod pair;
pub mod pattern;
