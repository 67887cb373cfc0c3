//! Types shared by every game variant: players, status, winners, base state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Identifier of a seat in a game.
///
/// The set is closed: a game always has exactly one human seat and one agent seat.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerId {
    /// The human seat.
    Player1,
    /// The automated agent seat.
    Ai,
}

impl PlayerId {
    /// Returns true for the human seat.
    pub fn is_human(self) -> bool {
        self == PlayerId::Player1
    }
}

/// A participant in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Seat identifier, unique within a game.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Whether this seat is driven by the automated agent.
    #[serde(rename = "isAI")]
    pub is_ai: bool,
}

impl Player {
    /// Creates the human participant.
    #[instrument(skip(name))]
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::Player1,
            name: name.into(),
            is_ai: false,
        }
    }

    /// Creates the agent participant.
    #[instrument(skip(name))]
    pub fn agent(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::Ai,
            name: name.into(),
            is_ai: true,
        }
    }
}

/// Lifecycle of a game. Only ever moves forward.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    /// Created, not yet accepting moves.
    Waiting,
    /// Accepting moves.
    Playing,
    /// Over; a winner (or draw) is recorded.
    Finished,
}

/// Outcome of a finished game or a resolved round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Winner {
    /// A seat won.
    Player(PlayerId),
    /// Nobody won.
    Draw,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Player(id) => write!(f, "{}", id),
            Winner::Draw => write!(f, "draw"),
        }
    }
}

impl FromStr for Winner {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "draw" {
            Ok(Winner::Draw)
        } else {
            PlayerId::from_str(s).map(Winner::Player)
        }
    }
}

impl From<Winner> for String {
    fn from(winner: Winner) -> Self {
        winner.to_string()
    }
}

impl TryFrom<String> for Winner {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Result reported by a rules engine when a game has ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Who won, or draw.
    pub winner: Winner,
    /// Human-readable explanation ("Won 2-1", "Three in a row on the top row", ...).
    pub reason: String,
}

impl GameResult {
    /// Creates a result.
    pub fn new(winner: Winner, reason: impl Into<String>) -> Self {
        Self {
            winner,
            reason: reason.into(),
        }
    }
}

/// Fields every game state carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseState {
    /// Game id.
    pub id: String,
    /// Participants in seating order. The first seat moves first.
    pub players: Vec<Player>,
    /// Seat whose move is currently expected.
    pub current_player_id: PlayerId,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Set if and only if `status` is finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last accepted mutation.
    pub updated_at: DateTime<Utc>,
}

impl BaseState {
    /// Creates a base state that is ready to accept moves.
    #[instrument(skip(players))]
    pub fn new(
        id: String,
        players: Vec<Player>,
        current_player_id: PlayerId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            players,
            current_player_id,
            status: GameStatus::Playing,
            winner: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// Returns true if the seat takes part in this game.
    pub fn has_player(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Returns the participant in the given seat.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Returns the seat index (0 or 1) of a participant.
    pub fn seat_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Returns the seat that moves first.
    pub fn first_player_id(&self) -> PlayerId {
        self.players
            .first()
            .map(|p| p.id)
            .unwrap_or(self.current_player_id)
    }

    /// Returns the other participant.
    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        self.players.iter().map(|p| p.id).find(|other| *other != id)
    }

    /// Returns true while moves are accepted.
    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    /// Marks the game finished with the given winner.
    pub(crate) fn finish(&mut self, winner: Winner) {
        self.status = GameStatus::Finished;
        self.winner = Some(winner);
    }
}
