//! Core domain types for tic-tac-toe.

use super::position::Position;
use crate::games::common::{BaseState, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mark placed on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum Symbol {
    /// Moves first.
    X,
    /// Moves second.
    O,
}

impl Symbol {
    /// Returns the opposing symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

/// 3x3 tic-tac-toe board, serialized as rows of cells (`"X"`, `"O"` or `null`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Option<Symbol>; 3]; 3],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the symbol at the given position.
    pub fn get(&self, pos: Position) -> Option<Symbol> {
        self.cells[pos.row()][pos.col()]
    }

    /// Places a symbol at the given position.
    pub fn set(&mut self, pos: Position, symbol: Symbol) {
        self.cells[pos.row()][pos.col()] = Some(symbol);
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    /// True when every cell is occupied.
    pub fn is_full(&self) -> bool {
        Position::ALL.iter().all(|pos| !self.is_empty(*pos))
    }

    /// Number of cells holding the symbol.
    pub fn count(&self, symbol: Symbol) -> usize {
        Position::ALL
            .iter()
            .filter(|pos| self.get(**pos) == Some(symbol))
            .count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let symbol = match self.cells[row][col] {
                    None => (row * 3 + col + 1).to_string(),
                    Some(symbol) => symbol.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// A tic-tac-toe move: the zero-based cell to mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicTacToeMove {
    /// Row, 0-2.
    pub row: usize,
    /// Column, 0-2.
    pub col: usize,
}

impl TicTacToeMove {
    /// Creates a move.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns the board position, or `None` when out of range.
    pub fn position(&self) -> Option<Position> {
        Position::from_coords(self.row, self.col)
    }
}

impl From<Position> for TicTacToeMove {
    fn from(pos: Position) -> Self {
        Self::new(pos.row(), pos.col())
    }
}

/// Complete tic-tac-toe game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicTacToeState {
    /// Shared game fields.
    #[serde(flatten)]
    pub base: BaseState,
    /// The board.
    pub board: Board,
    /// Which symbol each seat plays.
    pub player_symbols: BTreeMap<PlayerId, Symbol>,
}

impl TicTacToeState {
    /// Symbol played by the seat.
    pub fn symbol_of(&self, player: PlayerId) -> Option<Symbol> {
        self.player_symbols.get(&player).copied()
    }

    /// Seat playing the symbol.
    pub fn player_with(&self, symbol: Symbol) -> Option<PlayerId> {
        self.player_symbols
            .iter()
            .find(|(_, s)| **s == symbol)
            .map(|(id, _)| *id)
    }
}
