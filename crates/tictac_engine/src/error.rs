//! Move validation errors.

use derive_more::{Display, Error};

/// Why a move request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum MoveErrorKind {
    /// Board does not have nine cells.
    #[display("board must be an array of length 9, got {}", _0)]
    BoardLength(usize),
    /// A cell holds something other than 0, 1 or 2.
    #[display("board values must be 0|1|2, got {} at index {}", value, index)]
    CellValue {
        /// Offending cell.
        index: usize,
        /// Offending value.
        value: i64,
    },
    /// Requested cell is outside 0..=8.
    #[display("cellIndex must be 0..8, got {}", _0)]
    CellIndex(i64),
    /// Requested cell already holds a mark.
    #[display("cell {} is not empty", _0)]
    CellOccupied(usize),
}

/// Move validation error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Move error: {} at {}:{}", kind, file, line)]
pub struct MoveError {
    /// What was wrong with the request.
    pub kind: MoveErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl MoveError {
    /// Creates a new move error with caller location tracking.
    #[track_caller]
    pub fn new(kind: MoveErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
