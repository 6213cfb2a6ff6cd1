pub mod outcome;
pub mod scorer;
pub mod tally;
