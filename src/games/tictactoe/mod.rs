//! Tic-tac-toe board, marks and rules.

mod types;
pub mod rules;

pub use rules::{Outcome, evaluate};
pub use types::{Board, CELL_COUNT, Mark, Square};
