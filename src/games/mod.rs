//! Game variants and the rules engine that dispatches between them.
//!
//! The set of games is closed: [`GameState`] and [`GameMove`] are enums, and
//! [`RulesEngine`] matches on them to reach the per-game [`GameRules`]
//! implementation. Adding a game means adding a variant, which the compiler
//! then forces through every match.

mod common;
mod rules;
pub mod rps;
pub mod tictactoe;

pub use common::{BaseState, GameResult, GameStatus, Player, PlayerId, Winner};
pub use rules::{GameOptions, GameRules, MoveError};

use crate::error::GameError;
use chrono::{DateTime, Utc};
use rps::{Choice, RpsMove, RpsRules, RpsState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tictactoe::{TicTacToeMove, TicTacToeRules, TicTacToeState};
use tracing::{instrument, warn};

/// Tag identifying a game variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum GameType {
    /// Tic-tac-toe.
    #[serde(rename = "tictactoe")]
    #[strum(serialize = "tictactoe")]
    TicTacToe,
    /// Best-of-N rock-paper-scissors.
    #[serde(rename = "rps")]
    #[strum(serialize = "rps")]
    RockPaperScissors,
}

/// State of any supported game, tagged with its game type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gameType", content = "state")]
pub enum GameState {
    /// Tic-tac-toe state.
    #[serde(rename = "tictactoe")]
    TicTacToe(TicTacToeState),
    /// Rock-paper-scissors state.
    #[serde(rename = "rps")]
    RockPaperScissors(RpsState),
}

impl GameState {
    /// The game variant.
    pub fn game_type(&self) -> GameType {
        match self {
            GameState::TicTacToe(_) => GameType::TicTacToe,
            GameState::RockPaperScissors(_) => GameType::RockPaperScissors,
        }
    }

    /// Fields shared by all variants.
    pub fn base(&self) -> &BaseState {
        match self {
            GameState::TicTacToe(s) => &s.base,
            GameState::RockPaperScissors(s) => &s.base,
        }
    }

    pub(crate) fn base_mut(&mut self) -> &mut BaseState {
        match self {
            GameState::TicTacToe(s) => &mut s.base,
            GameState::RockPaperScissors(s) => &mut s.base,
        }
    }
}

/// A move in any supported game.
///
/// Serialized without a tag: `{"row": 1, "col": 2}` or `{"choice": "rock"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameMove {
    /// Mark a tic-tac-toe cell.
    TicTacToe(TicTacToeMove),
    /// Throw a hand shape.
    RockPaperScissors(RpsMove),
}

#[derive(Deserialize)]
struct RawChoice {
    choice: String,
}

impl GameMove {
    /// The game variant this move belongs to.
    pub fn game_type(&self) -> GameType {
        match self {
            GameMove::TicTacToe(_) => GameType::TicTacToe,
            GameMove::RockPaperScissors(_) => GameType::RockPaperScissors,
        }
    }

    /// Parses a wire payload into a typed move for the given game.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MalformedInput`] when the payload does not have the
    /// game's move shape, and [`GameError::InvalidMove`] when a
    /// rock-paper-scissors choice names an unknown hand.
    #[instrument(skip(value))]
    pub fn parse(game_type: GameType, value: serde_json::Value) -> Result<Self, GameError> {
        match game_type {
            GameType::TicTacToe => serde_json::from_value::<TicTacToeMove>(value)
                .map(GameMove::TicTacToe)
                .map_err(|e| {
                    warn!(error = %e, "Unparsable tic-tac-toe move");
                    GameError::malformed(format!(
                        "Expected a tic-tac-toe move {{\"row\", \"col\"}}: {}",
                        e
                    ))
                }),
            GameType::RockPaperScissors => {
                let raw: RawChoice = serde_json::from_value(value).map_err(|e| {
                    warn!(error = %e, "Unparsable rock-paper-scissors move");
                    GameError::malformed(format!("Expected a move {{\"choice\"}}: {}", e))
                })?;
                let choice = Choice::from_str(raw.choice.trim())
                    .map_err(|_| GameError::from(MoveError::UnknownChoice(raw.choice.clone())))?;
                Ok(GameMove::RockPaperScissors(RpsMove::new(choice)))
            }
        }
    }
}

impl fmt::Display for GameMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMove::TicTacToe(m) => write!(f, "({}, {})", m.row, m.col),
            GameMove::RockPaperScissors(m) => write!(f, "{}", m.choice),
        }
    }
}

/// Dispatches to the per-game rules. Stateless; construct once and share.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesEngine {
    tictactoe: TicTacToeRules,
    rps: RpsRules,
}

impl RulesEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the initial state for a new game.
    #[instrument(skip(self, players, options))]
    pub fn initial_state(
        &self,
        game_type: GameType,
        id: String,
        players: [Player; 2],
        options: &GameOptions,
        at: DateTime<Utc>,
    ) -> GameState {
        match game_type {
            GameType::TicTacToe => {
                GameState::TicTacToe(self.tictactoe.initial_state(id, players, options, at))
            }
            GameType::RockPaperScissors => {
                GameState::RockPaperScissors(self.rps.initial_state(id, players, options, at))
            }
        }
    }

    /// Checks a move against the state, explaining any rejection.
    pub fn check_move(
        &self,
        state: &GameState,
        mv: &GameMove,
        player: PlayerId,
    ) -> Result<(), MoveError> {
        match (state, mv) {
            (GameState::TicTacToe(s), GameMove::TicTacToe(m)) => {
                self.tictactoe.check_move(s, m, player)
            }
            (GameState::RockPaperScissors(s), GameMove::RockPaperScissors(m)) => {
                self.rps.check_move(s, m, player)
            }
            _ => Err(MoveError::WrongGame(state.game_type())),
        }
    }

    /// Returns true if the move is legal right now.
    pub fn validate_move(&self, state: &GameState, mv: &GameMove, player: PlayerId) -> bool {
        self.check_move(state, mv, player).is_ok()
    }

    /// Returns the state after the move.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if the move is illegal or belongs to another game.
    pub fn apply_move(
        &self,
        state: &GameState,
        mv: &GameMove,
        player: PlayerId,
        at: DateTime<Utc>,
    ) -> Result<GameState, MoveError> {
        match (state, mv) {
            (GameState::TicTacToe(s), GameMove::TicTacToe(m)) => self
                .tictactoe
                .apply_move(s, m, player, at)
                .map(GameState::TicTacToe),
            (GameState::RockPaperScissors(s), GameMove::RockPaperScissors(m)) => self
                .rps
                .apply_move(s, m, player, at)
                .map(GameState::RockPaperScissors),
            _ => Err(MoveError::WrongGame(state.game_type())),
        }
    }

    /// Reports the result if the game is over.
    pub fn check_game_end(&self, state: &GameState) -> Option<GameResult> {
        match state {
            GameState::TicTacToe(s) => self.tictactoe.check_game_end(s),
            GameState::RockPaperScissors(s) => self.rps.check_game_end(s),
        }
    }

    /// Every move the seat could legally make right now.
    pub fn valid_moves(&self, state: &GameState, player: PlayerId) -> Vec<GameMove> {
        match state {
            GameState::TicTacToe(s) => self
                .tictactoe
                .valid_moves(s, player)
                .into_iter()
                .map(GameMove::TicTacToe)
                .collect(),
            GameState::RockPaperScissors(s) => self
                .rps
                .valid_moves(s, player)
                .into_iter()
                .map(GameMove::RockPaperScissors)
                .collect(),
        }
    }
}
