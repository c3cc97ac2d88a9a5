//! Core domain types for the move engine.

use serde::{Deserialize, Serialize};

use crate::{MoveError, MoveErrorKind};

/// Content of a single board cell.
///
/// On the wire a cell is a small integer: `0` empty, `1` player, `2` opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// The human player (X).
    Player,
    /// The engine-controlled opponent (O).
    Opponent,
}

impl Cell {
    /// Wire value of the cell.
    pub fn to_u8(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Player => 1,
            Cell::Opponent => 2,
        }
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> Self {
        cell.to_u8()
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::Player),
            2 => Ok(Cell::Opponent),
            other => Err(format!("cell value must be 0|1|2, got {}", other)),
        }
    }
}

/// 3x3 board, cells in row-major order (0-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from untrusted wire values.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if there are not exactly nine values or any
    /// value is outside `0..=2`.
    #[track_caller]
    pub fn from_cells(values: &[i64]) -> Result<Self, MoveError> {
        if values.len() != 9 {
            return Err(MoveError::new(MoveErrorKind::BoardLength(values.len())));
        }
        let mut cells = [Cell::Empty; 9];
        for (index, &value) in values.iter().enumerate() {
            cells[index] = u8::try_from(value)
                .ok()
                .and_then(|v| Cell::try_from(v).ok())
                .ok_or_else(|| MoveError::new(MoveErrorKind::CellValue { index, value }))?;
        }
        Ok(Self { cells })
    }

    /// Gets the cell at the given index, `None` past the edge.
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Checks if a cell exists and is empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    /// All cells.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Indices of empty cells in ascending order.
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..9).filter(|&i| self.is_empty(i)).collect()
    }

    /// Wire representation of the board.
    pub fn to_wire(&self) -> [u8; 9] {
        self.cells.map(Cell::to_u8)
    }

    /// Returns a copy with `cell` written at `index`.
    ///
    /// Callers only write into empty cells; the engine never clears a cell.
    pub(crate) fn with(mut self, index: usize, cell: Cell) -> Self {
        self.cells[index] = cell;
        self
    }
}

/// Outcome of a move, from the player's point of view.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameStatus {
    /// Game is ongoing.
    InProgress,
    /// Player completed a line.
    Win,
    /// Opponent completed a line.
    Lose,
    /// Board is full with no line.
    Draw,
}

impl GameStatus {
    /// Whether the game has ended.
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cells_rejects_short_board() {
        let err = Board::from_cells(&[0; 8]).unwrap_err();
        assert_eq!(err.kind, MoveErrorKind::BoardLength(8));
    }

    #[test]
    fn test_from_cells_rejects_bad_value() {
        let err = Board::from_cells(&[0, 0, 3, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(err.kind, MoveErrorKind::CellValue { index: 2, value: 3 });

        let err = Board::from_cells(&[0, -1, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(err.kind, MoveErrorKind::CellValue { index: 1, value: -1 });
    }

    #[test]
    fn test_wire_round_trip_preserves_cells() {
        let board = Board::from_cells(&[1, 2, 0, 0, 1, 0, 2, 0, 0]).unwrap();
        assert_eq!(board.to_wire(), [1, 2, 0, 0, 1, 0, 2, 0, 0]);
        assert_eq!(board.empty_cells(), vec![2, 3, 5, 7, 8]);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(GameStatus::InProgress.to_string(), "in_progress");
        assert_eq!(serde_json::to_string(&GameStatus::Lose).unwrap(), "\"lose\"");
    }
}
