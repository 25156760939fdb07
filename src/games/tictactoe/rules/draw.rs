//! Draw detection logic for tic-tac-toe.

use super::super::{Board, Square};
use tracing::instrument;

/// Checks if the board is full (all cells occupied).
///
/// A full board with no winner indicates a draw.
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}

#[cfg(test)]
mod tests {
    use super::super::super::Mark;
    use super::super::evaluate;
    use super::*;

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_partial_board_not_full() {
        let mut board = Board::new();
        board.place(4, Mark::X);
        assert!(!is_full(&board));
    }

    #[test]
    fn test_draw_detection() {
        // X O X / X O O / O X X
        let mut board = Board::new();
        for (i, mark) in [
            (0, Mark::X),
            (1, Mark::O),
            (2, Mark::X),
            (3, Mark::X),
            (4, Mark::O),
            (5, Mark::O),
            (6, Mark::O),
            (7, Mark::X),
            (8, Mark::X),
        ] {
            board.place(i, mark);
        }
        assert!(is_full(&board));
        assert!(evaluate(&board).is_draw);
    }

    #[test]
    fn test_not_draw_if_winner_on_full_board() {
        // X X X / O O X / X O O
        let mut board = Board::new();
        for (i, mark) in [
            (0, Mark::X),
            (1, Mark::X),
            (2, Mark::X),
            (3, Mark::O),
            (4, Mark::O),
            (5, Mark::X),
            (6, Mark::X),
            (7, Mark::O),
            (8, Mark::O),
        ] {
            board.place(i, mark);
        }
        let outcome = evaluate(&board);
        assert_eq!(outcome.winner, Some(Mark::X));
        assert!(!outcome.is_draw);
    }
}
