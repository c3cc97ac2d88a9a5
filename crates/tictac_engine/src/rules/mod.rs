//! Game rules for tic-tac-toe.
//!
//! Pure functions for evaluating a board. Rules are separated from board
//! storage so the engine and the opponent heuristic can share them.

mod draw;
mod win;

pub use draw::is_full;
pub use win::{LINES, has_line};

use crate::{Board, Cell, GameStatus};
use tracing::instrument;

/// Status of a board relative to the player: a player line is a win,
/// an opponent line is a loss.
///
/// A player line takes precedence when both marks hold a line.
#[instrument(skip(board))]
pub fn status_of(board: &Board) -> GameStatus {
    if has_line(board, Cell::Player) {
        GameStatus::Win
    } else if has_line(board, Cell::Opponent) {
        GameStatus::Lose
    } else if is_full(board) {
        GameStatus::Draw
    } else {
        GameStatus::InProgress
    }
}
