//! The persisted record of one game: state, move history, metadata.

use crate::games::{BaseState, GameMove, GameState, GameStatus, GameType, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Strength of the automated opponent.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Random legal moves.
    Easy,
    /// Simple tactics.
    #[default]
    Medium,
    /// Best play the heuristics know.
    Hard,
}

/// One accepted move. History entries are never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// Seat that moved.
    pub player_id: PlayerId,
    /// The move.
    #[serde(rename = "move")]
    pub mv: GameMove,
    /// When it was accepted.
    pub timestamp: DateTime<Utc>,
}

impl MoveRecord {
    /// Creates a history entry.
    pub fn new(player_id: PlayerId, mv: GameMove, timestamp: DateTime<Utc>) -> Self {
        Self {
            player_id,
            mv,
            timestamp,
        }
    }
}

/// A game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    /// Game state, tagged with the game type.
    pub game: GameState,
    /// Accepted moves in submission order.
    #[serde(default)]
    pub history: Vec<MoveRecord>,
    /// Agent strength chosen at creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl GameSession {
    /// Creates a session with empty history.
    #[instrument(skip(game), fields(game_id = %game.base().id, game_type = %game.game_type()))]
    pub fn new(game: GameState, difficulty: Option<Difficulty>) -> Self {
        Self {
            game,
            history: Vec::new(),
            difficulty,
        }
    }

    /// Game id.
    pub fn id(&self) -> &str {
        &self.game.base().id
    }

    /// Game variant.
    pub fn game_type(&self) -> GameType {
        self.game.game_type()
    }

    /// Shared state fields.
    pub fn base(&self) -> &BaseState {
        self.game.base()
    }

    /// Lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.base().status
    }

    /// Seat whose move is expected.
    pub fn current_player_id(&self) -> PlayerId {
        self.base().current_player_id
    }

    /// Time of the last accepted mutation.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.base().updated_at
    }

    /// Agent strength, falling back to the default.
    pub fn difficulty_or_default(&self) -> Difficulty {
        self.difficulty.unwrap_or_default()
    }
}
