//! Stateless tic-tac-toe move engine.
//!
//! One call to [`apply_move`] validates a client-held board, places the
//! player's mark, and (unless the game is already over) answers with a single
//! opponent move. Nothing is persisted between calls; the board travels with
//! every request.
//!
//! # Example
//!
//! ```
//! use rand::rngs::mock::StepRng;
//! use tictac_engine::{Board, GameStatus, apply_move};
//!
//! let board = Board::from_cells(&[1, 2, 1, 2, 1, 0, 0, 0, 0]).unwrap();
//! let outcome = apply_move(board, 6, &mut StepRng::new(0, 0)).unwrap();
//! assert_eq!(outcome.status(), GameStatus::Win);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod engine;
mod error;
mod opponent;
mod rules;
mod types;

pub use engine::{MoveOutcome, apply_move};
pub use error::{MoveError, MoveErrorKind};
pub use opponent::{BLOCK_PROBABILITY, OPTIMAL_PROBABILITY, PREFERENCE_ORDER, choose_move};
pub use rules::{LINES, has_line, is_full, status_of};
pub use types::{Board, Cell, GameStatus};
