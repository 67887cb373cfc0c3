//! Error taxonomy surfaced to callers.

use crate::games::{GameType, MoveError};
use crate::store::StoreError;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Stable, machine-checkable error category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// No session with that id (and type).
    NotFound,
    /// Rejected by the rules engine; nothing was changed.
    InvalidMove,
    /// The request payload could not be understood.
    MalformedInput,
    /// The session store failed.
    Storage,
    /// The move-selection agent could not produce a move.
    Agent,
}

/// Failure of a game operation.
#[derive(Debug, Clone, Display, Error)]
pub enum GameError {
    /// No session with that id.
    #[display("No {} game with id '{}'", game_type, id)]
    NotFound {
        /// Requested game type.
        game_type: GameType,
        /// Requested id.
        id: String,
    },

    /// Shape or turn-order violation.
    #[display("Invalid move: {}", reason)]
    InvalidMove {
        /// Why the rules engine refused.
        reason: MoveError,
    },

    /// Unparsable request.
    #[display("Malformed input: {}", message)]
    MalformedInput {
        /// What was wrong.
        message: String,
    },

    /// Storage error, passed through unchanged.
    #[display("{}", source)]
    Storage {
        /// Underlying store error.
        source: StoreError,
    },

    /// The agent failed to choose a move.
    #[display("Agent error: {}", message)]
    Agent {
        /// What went wrong.
        message: String,
    },
}

impl GameError {
    /// Creates a not-found error.
    pub fn not_found(game_type: GameType, id: impl Into<String>) -> Self {
        Self::NotFound {
            game_type,
            id: id.into(),
        }
    }

    /// Creates a malformed-input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Creates an agent error.
    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent {
            message: message.into(),
        }
    }

    /// The stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidMove { .. } => ErrorKind::InvalidMove,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Agent { .. } => ErrorKind::Agent,
        }
    }
}

impl From<MoveError> for GameError {
    fn from(reason: MoveError) -> Self {
        Self::InvalidMove { reason }
    }
}

impl From<StoreError> for GameError {
    fn from(source: StoreError) -> Self {
        Self::Storage { source }
    }
}
