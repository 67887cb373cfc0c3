//! Tic-tac-toe: board, positions, and rules.

mod position;
mod rules;
mod types;

pub use position::Position;
pub use rules::{TicTacToeRules, check_winner};
pub use types::{Board, Symbol, TicTacToeMove, TicTacToeState};
