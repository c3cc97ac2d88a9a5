//! Opponent move selection.
//!
//! A weighted-random heuristic rather than minimax: it always takes a win,
//! usually blocks, and otherwise leans toward strong cells. The randomness
//! keeps it beatable.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use crate::{Board, Cell, has_line};

/// Chance that the opponent blocks an immediate player win.
pub const BLOCK_PROBABILITY: f64 = 0.8;

/// Chance that the opponent takes the top-ranked cell instead of a random
/// pick among the top three.
pub const OPTIMAL_PROBABILITY: f64 = 0.65;

/// Cell preference: center, corners, edges.
pub const PREFERENCE_ORDER: [usize; 9] = [4, 0, 2, 6, 8, 1, 3, 5, 7];

/// Picks the opponent's reply, or `None` when the board is full.
///
/// The random source is injected so tests can pin its decisions.
#[instrument(skip(board, rng))]
pub fn choose_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<usize> {
    if board.empty_cells().is_empty() {
        return None;
    }

    if let Some(cell) = winning_cell(board, Cell::Opponent) {
        debug!(cell, "Opponent takes winning cell");
        return Some(cell);
    }

    if let Some(cell) = winning_cell(board, Cell::Player) {
        if rng.gen_bool(BLOCK_PROBABILITY) {
            debug!(cell, "Opponent blocks player");
            return Some(cell);
        }
        debug!(cell, "Opponent misses the block");
    }

    let ranked: Vec<usize> = PREFERENCE_ORDER
        .iter()
        .copied()
        .filter(|&i| board.is_empty(i))
        .collect();

    if rng.gen_bool(OPTIMAL_PROBABILITY) {
        return ranked.first().copied();
    }

    let top = &ranked[..ranked.len().min(3)];
    top.choose(rng).copied().or_else(|| ranked.first().copied())
}

/// First empty cell (ascending index) that would complete a line for `mark`.
fn winning_cell(board: &Board, mark: Cell) -> Option<usize> {
    board
        .empty_cells()
        .into_iter()
        .find(|&i| has_line(&board.with(i, mark), mark))
}
