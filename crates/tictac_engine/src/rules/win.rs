//! Win detection logic for tic-tac-toe.

use crate::{Board, Cell};
use tracing::instrument;

/// The eight winning triples: rows, columns, diagonals.
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

/// Whether `mark` fills at least one line.
#[instrument(skip(board))]
pub fn has_line(board: &Board, mark: Cell) -> bool {
    mark != Cell::Empty
        && LINES
            .iter()
            .any(|line| line.iter().all(|&i| board.cells()[i] == mark))
}
