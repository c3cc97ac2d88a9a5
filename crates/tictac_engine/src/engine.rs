//! The stateless move step.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{Board, Cell, GameStatus, MoveError, MoveErrorKind, choose_move, status_of};

/// Result of one engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    status: GameStatus,
    board: Board,
    opponent_cell: Option<usize>,
}

impl MoveOutcome {
    /// Status after the step.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Board after the step.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Where the opponent replied, if it moved.
    pub fn opponent_cell(&self) -> Option<usize> {
        self.opponent_cell
    }
}

/// Applies the player's move at `cell_index` and, if the game continues,
/// one opponent reply.
///
/// The player's result is evaluated before the opponent moves, so a winning
/// move ends the game without a reply. A line the opponent already held is
/// reported as a loss straight away.
///
/// # Errors
///
/// Returns [`MoveError`] if `cell_index` is outside 0..=8 or the cell is
/// occupied. The input board is never modified.
#[instrument(skip(board, rng))]
pub fn apply_move<R: Rng + ?Sized>(
    board: Board,
    cell_index: i64,
    rng: &mut R,
) -> Result<MoveOutcome, MoveError> {
    let index = usize::try_from(cell_index)
        .ok()
        .filter(|&i| i < 9)
        .ok_or_else(|| MoveError::new(MoveErrorKind::CellIndex(cell_index)))?;
    if !board.is_empty(index) {
        return Err(MoveError::new(MoveErrorKind::CellOccupied(index)));
    }

    let next = board.with(index, Cell::Player);
    let after_player = status_of(&next);
    if after_player.is_terminal() {
        debug!(status = %after_player, "Game over after player move");
        return Ok(MoveOutcome {
            status: after_player,
            board: next,
            opponent_cell: None,
        });
    }

    let opponent_cell = choose_move(&next, rng);
    let next = match opponent_cell {
        Some(cell) => next.with(cell, Cell::Opponent),
        None => next,
    };
    let status = status_of(&next);
    debug!(?opponent_cell, status = %status, "Opponent replied");

    Ok(MoveOutcome {
        status,
        board: next,
        opponent_cell,
    })
}
