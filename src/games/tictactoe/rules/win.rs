//! Win detection logic for tic-tac-toe.

use super::super::{Board, Mark, Square};
use tracing::instrument;

/// The eight winning lines, scanned in this order.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Checks if there is a winner on the board.
///
/// Returns the mark of the first line in [`LINES`] whose three cells are
/// occupied by the same mark, `None` otherwise.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|&[a, b, c]| {
        let sq = board.get(a)?;
        match sq {
            Square::Occupied(mark) if board.get(b) == Some(sq) && board.get(c) == Some(sq) => {
                Some(mark)
            }
            _ => None,
        }
    })
}
