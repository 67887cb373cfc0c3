//! The agent-visible projection of a session.
//!
//! The store holds canonical sessions. Anything the automated agent can read
//! goes through [`Sanitizer`], which removes choices from rounds that are still
//! open, along with the history entries that recorded them. A
//! [`SanitizedSession`] can be read and serialized but never converted
//! back into a [`GameSession`], so it cannot reach the persist path.

use crate::error::GameError;
use crate::games::GameState;
use crate::games::rps::RpsState;
use crate::games::tictactoe::TicTacToeState;
use crate::games::GameType;
use crate::session::GameSession;
use crate::store::SharedStore;
use serde::{Deserialize, Deserializer, Serialize};
use std::ops::Deref;
use tracing::{debug, instrument};

/// A session with in-flight private data removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SanitizedSession(GameSession);

impl Deref for SanitizedSession {
    type Target = GameSession;

    fn deref(&self) -> &GameSession {
        &self.0
    }
}

// Anything deserialized as a view is sanitized again on the way in.
impl<'de> Deserialize<'de> for SanitizedSession {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        GameSession::deserialize(deserializer).map(SanitizedSession::from)
    }
}

impl From<GameSession> for SanitizedSession {
    fn from(session: GameSession) -> Self {
        Sanitizer.sanitize_owned(session)
    }
}

/// Derives agent views from canonical sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer;

impl Sanitizer {
    /// Returns the agent view of a session.
    #[instrument(skip(self, session), fields(game_id = %session.id(), game_type = %session.game_type()))]
    pub fn sanitize(&self, session: &GameSession) -> SanitizedSession {
        self.sanitize_owned(session.clone())
    }

    fn sanitize_owned(&self, mut session: GameSession) -> SanitizedSession {
        match &mut session.game {
            GameState::TicTacToe(state) => redact_tictactoe(state),
            GameState::RockPaperScissors(state) => {
                let visible_moves = redact_rps(state);
                session.history.truncate(visible_moves);
            }
        }
        SanitizedSession(session)
    }
}

/// Both sides always see the full board; nothing to hide.
fn redact_tictactoe(_state: &mut TicTacToeState) {}

/// Blanks every round that has not been resolved, whichever side has chosen.
///
/// Returns how many history entries belong to resolved rounds. Each resolved
/// round took exactly two moves; anything after those is an open choice.
fn redact_rps(state: &mut RpsState) -> usize {
    let mut redacted = 0;
    for round in state.rounds.iter_mut().filter(|r| !r.is_resolved()) {
        if round.player1_choice.is_some() || round.player2_choice.is_some() {
            redacted += 1;
        }
        round.redact();
    }
    if redacted > 0 {
        debug!(redacted, "Redacted open round choices");
    }
    2 * state.rounds.iter().filter(|r| r.is_resolved()).count()
}

/// The only read path offered to the automated agent.
#[derive(Debug, Clone)]
pub struct SanitizedReader {
    store: SharedStore,
    sanitizer: Sanitizer,
}

impl SanitizedReader {
    /// Creates a reader over the store.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            sanitizer: Sanitizer,
        }
    }

    /// Loads one session as the agent sees it.
    ///
    /// # Errors
    ///
    /// [`GameError::NotFound`] if there is no session of that type and id;
    /// [`GameError::Storage`] if the store fails.
    #[instrument(skip(self))]
    pub async fn get(&self, game_type: GameType, id: &str) -> Result<SanitizedSession, GameError> {
        match self.store.get(id).await? {
            Some(session) if session.game_type() == game_type => {
                Ok(self.sanitizer.sanitize_owned(session))
            }
            _ => Err(GameError::not_found(game_type, id)),
        }
    }

    /// Lists every session of a type as the agent sees it.
    ///
    /// # Errors
    ///
    /// [`GameError::Storage`] if the store fails.
    #[instrument(skip(self))]
    pub async fn list(&self, game_type: GameType) -> Result<Vec<SanitizedSession>, GameError> {
        let sessions = self.store.list_by_type(game_type).await?;
        Ok(sessions
            .into_iter()
            .map(|s| self.sanitizer.sanitize_owned(s))
            .collect())
    }
}
