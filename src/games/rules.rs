//! The capability every game variant implements.
//!
//! Rules are pure: no I/O, no clock reads, no interior mutability. Timestamps
//! are passed in by the caller so the same inputs always produce the same
//! output.

use super::common::{GameResult, GameStatus, Player, PlayerId};
use super::tictactoe::{Position, Symbol};
use super::GameType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason a move was rejected by a rules engine.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// Moves are only accepted while the game is playing.
    #[display("Game is not in progress (status: {})", _0)]
    GameNotPlaying(GameStatus),

    /// The seat does not take part in this game.
    #[display("Unknown player '{}'", _0)]
    UnknownPlayer(String),

    /// It is another seat's turn.
    #[display("It's not {}'s turn", _0)]
    NotYourTurn(PlayerId),

    /// Row or column outside 0-2.
    #[display("Cell ({}, {}) is out of range", row, col)]
    OutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },

    /// The square at the position is already occupied.
    #[display("Square {} is already occupied", _0)]
    CellOccupied(Position),

    /// The seat already submitted a choice for the current round.
    #[display("{} already chose this round", _0)]
    AlreadyChose(PlayerId),

    /// Every round has been played.
    #[display("All rounds have been played")]
    RoundsExhausted,

    /// The choice is not one of rock, paper, scissors.
    #[display("'{}' is not a valid choice (rock, paper, scissors)", _0)]
    UnknownChoice(String),

    /// The move belongs to a different game.
    #[display("Move does not belong to a {} game", _0)]
    WrongGame(GameType),
}

impl std::error::Error for MoveError {}

/// Knobs applied when a game is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// Number of rock-paper-scissors rounds.
    pub max_rounds: usize,
    /// Symbol the human plays in tic-tac-toe. X always moves first.
    pub human_symbol: Symbol,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            human_symbol: Symbol::X,
        }
    }
}

/// The five operations of a game's rules engine.
///
/// Implementors are stateless values; every method is deterministic.
pub trait GameRules {
    /// Full game state.
    type State;
    /// A single move.
    type Move;

    /// Builds the initial state for two participants, human seat first.
    fn initial_state(
        &self,
        id: String,
        players: [Player; 2],
        options: &GameOptions,
        at: DateTime<Utc>,
    ) -> Self::State;

    /// Checks a move, explaining any rejection.
    fn check_move(
        &self,
        state: &Self::State,
        mv: &Self::Move,
        player: PlayerId,
    ) -> Result<(), MoveError>;

    /// Returns true if the move is legal right now.
    fn validate_move(&self, state: &Self::State, mv: &Self::Move, player: PlayerId) -> bool {
        self.check_move(state, mv, player).is_ok()
    }

    /// Returns the state after the move. The input is never modified.
    ///
    /// # Errors
    ///
    /// Returns the same [`MoveError`] that [`GameRules::check_move`] would.
    fn apply_move(
        &self,
        state: &Self::State,
        mv: &Self::Move,
        player: PlayerId,
        at: DateTime<Utc>,
    ) -> Result<Self::State, MoveError>;

    /// Reports the result once the game is over. Does not touch status or winner.
    fn check_game_end(&self, state: &Self::State) -> Option<GameResult>;

    /// Every move the seat could legally make right now.
    fn valid_moves(&self, state: &Self::State, player: PlayerId) -> Vec<Self::Move>;
}
