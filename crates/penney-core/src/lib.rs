#![deny(warnings)]
//! Scoring engine for Penney's Game over binary card decks: deck and
//! pattern model, the single-pass trick/card scorer, and the cumulative
//! win-record table.
pub mod model;
pub mod score;
