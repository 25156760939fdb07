//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`]: no state, no I/O. The session layer
//! calls [`evaluate`] after every accepted move.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{LINES, check_winner};

use super::{Board, Mark};
use tracing::instrument;

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    /// Mark holding a completed line, if any.
    pub winner: Option<Mark>,
    /// True iff there is no winner and no empty cell.
    pub is_draw: bool,
}

impl Outcome {
    /// True when the game cannot continue.
    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.is_draw
    }
}

/// Computes the win/draw outcome of a board.
#[instrument(skip(board))]
pub fn evaluate(board: &Board) -> Outcome {
    let winner = check_winner(board);
    Outcome {
        winner,
        is_draw: winner.is_none() && is_full(board),
    }
}
