//! Session orchestration: create, move, read, delete.
//!
//! Every mutation of a stored session goes through [`GameOrchestrator`]. A move
//! from the human and a move from the agent take the same path: load, check,
//! apply, detect the end of the game, append history, persist. Nothing is
//! written when any step fails.

use crate::error::GameError;
use crate::games::{
    GameMove, GameOptions, GameStatus, GameType, Player, PlayerId, RulesEngine,
};
use crate::session::{Difficulty, GameSession, MoveRecord};
use crate::store::SharedStore;
use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

/// Display name given to the agent seat.
pub const AGENT_NAME: &str = "AI";

/// Parameters for a new game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Name of the human player.
    pub player_name: String,
    /// Caller-chosen id. Creating twice with the same id returns the first game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    /// Agent strength.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl CreateGameRequest {
    /// Creates a request with only a player name.
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Self::default()
        }
    }

    /// Sets the game id.
    pub fn with_game_id(mut self, id: impl Into<String>) -> Self {
        self.game_id = Some(id.into());
        self
    }

    /// Sets the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }
}

/// One async mutex per game id.
///
/// Holding the guard serializes load-apply-persist for that game, so two
/// movers can never both read the same version. An entry lives only while
/// some caller holds or waits on it.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    inner: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to a game id.
    pub async fn acquire(&self, id: &str) -> SessionGuard {
        let lock = {
            let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            table
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        SessionGuard {
            id: id.to_string(),
            table: self.inner.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of ids with a live entry.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when no id is locked or awaited.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one game id. Dropping it releases the lock and
/// removes the table entry once nobody else holds or awaits it.
#[derive(Debug)]
pub struct SessionGuard {
    id: String,
    table: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters hold a clone of the entry, so a count of one means only the table does.
        if table.get(&self.id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            table.remove(&self.id);
        }
    }
}

/// Coordinates the rules engine and the session store.
#[derive(Debug, Clone)]
pub struct GameOrchestrator {
    store: SharedStore,
    rules: RulesEngine,
    options: GameOptions,
    default_difficulty: Difficulty,
    locks: SessionLocks,
}

impl GameOrchestrator {
    /// Creates an orchestrator with default game options.
    pub fn new(store: SharedStore, rules: RulesEngine) -> Self {
        Self {
            store,
            rules,
            options: GameOptions::default(),
            default_difficulty: Difficulty::default(),
            locks: SessionLocks::new(),
        }
    }

    /// Replaces the options applied to new games.
    pub fn with_options(mut self, options: GameOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the difficulty used when a request names none.
    pub fn with_default_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.default_difficulty = difficulty;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The rules engine.
    pub fn rules(&self) -> &RulesEngine {
        &self.rules
    }

    /// The per-game lock table.
    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Creates a game, or returns the existing one when the id is taken by a
    /// game of the same type.
    ///
    /// # Errors
    ///
    /// [`GameError::MalformedInput`] for a blank player name or an id already
    /// used by another game type; [`GameError::Storage`] if the store fails.
    #[instrument(skip(self, req), fields(player_name = %req.player_name, game_id = ?req.game_id))]
    pub async fn create_game(
        &self,
        game_type: GameType,
        req: CreateGameRequest,
    ) -> Result<GameSession, GameError> {
        let player_name = req.player_name.trim();
        if player_name.is_empty() {
            return Err(GameError::malformed("playerName must not be empty"));
        }

        let id = match req.game_id.as_deref().map(str::trim) {
            Some("") => return Err(GameError::malformed("gameId must not be empty")),
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };

        let _guard = self.locks.acquire(&id).await;

        if let Some(existing) = self.store.get(&id).await? {
            if existing.game_type() != game_type {
                warn!(existing_type = %existing.game_type(), "Game id taken by another game type");
                return Err(GameError::malformed(format!(
                    "Game id '{}' is already used by a {} game",
                    id,
                    existing.game_type()
                )));
            }
            debug!(game_id = %id, "Returning existing game");
            return Ok(existing);
        }

        let players = [Player::human(player_name), Player::agent(AGENT_NAME)];
        let state = self
            .rules
            .initial_state(game_type, id.clone(), players, &self.options, Utc::now());
        let difficulty = req.difficulty.unwrap_or(self.default_difficulty);
        let session = GameSession::new(state, Some(difficulty));

        self.store.set(&id, &session).await?;
        info!(game_id = %id, %game_type, %difficulty, "Game created");
        Ok(session)
    }

    /// Applies a typed move on behalf of a seat and persists the result.
    ///
    /// # Errors
    ///
    /// [`GameError::NotFound`] if the game does not exist;
    /// [`GameError::InvalidMove`] if the rules engine rejects the move, in which
    /// case the stored session is left untouched; [`GameError::Storage`] if the
    /// store fails.
    #[instrument(skip(self, mv), fields(%mv))]
    pub async fn apply_move(
        &self,
        game_type: GameType,
        id: &str,
        player_id: PlayerId,
        mv: GameMove,
    ) -> Result<GameSession, GameError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.load(game_type, id).await?;

        if let Err(reason) = self.rules.check_move(&session.game, &mv, player_id) {
            warn!(%reason, "Move rejected");
            return Err(reason.into());
        }

        let at = next_timestamp(session.updated_at());
        let mut next = self.rules.apply_move(&session.game, &mv, player_id, at)?;
        if let Some(result) = self.rules.check_game_end(&next) {
            info!(winner = %result.winner, reason = %result.reason, "Game finished");
            next.base_mut().finish(result.winner);
        }

        session.game = next;
        session.history.push(MoveRecord::new(player_id, mv, at));
        self.store.set(id, &session).await?;

        debug!(
            moves = session.history.len(),
            status = %session.status(),
            current = %session.current_player_id(),
            "Move applied"
        );
        Ok(session)
    }

    /// Parses a raw player id and move payload, then applies the move.
    ///
    /// # Errors
    ///
    /// As [`GameOrchestrator::apply_move`], plus [`GameError::MalformedInput`]
    /// when the payload is not a move for this game and
    /// [`GameError::InvalidMove`] when the player id names no seat.
    #[instrument(skip(self, payload))]
    pub async fn submit_move(
        &self,
        game_type: GameType,
        id: &str,
        player_id: &str,
        payload: serde_json::Value,
    ) -> Result<GameSession, GameError> {
        let player = parse_player_id(player_id)?;
        let mv = GameMove::parse(game_type, payload)?;
        self.apply_move(game_type, id, player, mv).await
    }

    /// Loads the canonical session.
    ///
    /// # Errors
    ///
    /// [`GameError::NotFound`] or [`GameError::Storage`].
    #[instrument(skip(self))]
    pub async fn get_session(&self, game_type: GameType, id: &str) -> Result<GameSession, GameError> {
        self.load(game_type, id).await
    }

    /// Lists canonical sessions of one type, most recently updated first.
    ///
    /// # Errors
    ///
    /// [`GameError::Storage`] if the store fails.
    #[instrument(skip(self))]
    pub async fn list_sessions(&self, game_type: GameType) -> Result<Vec<GameSession>, GameError> {
        Ok(self.store.list_by_type(game_type).await?)
    }

    /// Removes a game.
    ///
    /// # Errors
    ///
    /// [`GameError::NotFound`] if there is no game of that type and id.
    #[instrument(skip(self))]
    pub async fn delete_session(&self, game_type: GameType, id: &str) -> Result<(), GameError> {
        let _guard = self.locks.acquire(id).await;
        self.load(game_type, id).await?;
        self.store.delete(id).await?;
        info!("Game deleted");
        Ok(())
    }

    /// Moves the seat could legally make right now. Empty when it is not the
    /// seat's turn or the game is over.
    ///
    /// # Errors
    ///
    /// [`GameError::NotFound`], [`GameError::Storage`], or
    /// [`GameError::InvalidMove`] for an unknown player id.
    #[instrument(skip(self))]
    pub async fn valid_moves(
        &self,
        game_type: GameType,
        id: &str,
        player_id: &str,
    ) -> Result<Vec<GameMove>, GameError> {
        let player = parse_player_id(player_id)?;
        let session = self.load(game_type, id).await?;
        if session.status() != GameStatus::Playing {
            return Ok(Vec::new());
        }
        Ok(self.rules.valid_moves(&session.game, player))
    }

    async fn load(&self, game_type: GameType, id: &str) -> Result<GameSession, GameError> {
        match self.store.get(id).await? {
            Some(session) if session.game_type() == game_type => Ok(session),
            Some(session) => {
                debug!(stored_type = %session.game_type(), "Game type mismatch");
                Err(GameError::not_found(game_type, id))
            }
            None => Err(GameError::not_found(game_type, id)),
        }
    }
}

/// Parses a wire player id. Unknown seats are rejected by the rules.
pub(crate) fn parse_player_id(raw: &str) -> Result<PlayerId, GameError> {
    PlayerId::from_str(raw.trim())
        .map_err(|_| GameError::from(crate::games::MoveError::UnknownPlayer(raw.to_string())))
}

/// The timestamp for the next accepted move: now, but always later than the
/// previous mutation.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
