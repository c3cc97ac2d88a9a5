//! Draw detection logic for tic-tac-toe.

use crate::{Board, Cell};
use tracing::instrument;

/// Checks if the board is full (all cells occupied).
///
/// A full board with no winner indicates a draw.
#[instrument(skip(board))]
pub fn is_full(board: &Board) -> bool {
    board.cells().iter().all(|c| *c != Cell::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameStatus, status_of};

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_draw_detection() {
        // X O X / O X X / O X O
        let board = Board::from_cells(&[1, 2, 1, 2, 1, 1, 2, 1, 2]).unwrap();
        assert!(is_full(&board));
        assert_eq!(status_of(&board), GameStatus::Draw);
    }

    #[test]
    fn test_not_draw_if_winner() {
        let board = Board::from_cells(&[1, 1, 1, 2, 2, 1, 2, 1, 2]).unwrap();
        assert!(is_full(&board));
        assert_eq!(status_of(&board), GameStatus::Win);
    }
}
