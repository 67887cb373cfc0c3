//! In-process session store.

use super::{SessionStore, StoreError};
use crate::games::GameType;
use crate::session::GameSession;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Keeps sessions in a shared map. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, GameSession>>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory session store");
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(id).cloned();
        if session.is_none() {
            debug!(session_id = id, "Session not found");
        }
        Ok(session)
    }

    #[instrument(skip(self, session), fields(game_type = %session.game_type()))]
    async fn set(&self, id: &str, session: &GameSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.to_string(), session.clone());
        debug!(session_id = id, "Session stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        info!(session_id = id, removed, "Session deleted");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn list_by_type(&self, game_type: GameType) -> Result<Vec<GameSession>, StoreError> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<GameSession> = sessions
            .values()
            .filter(|s| s.game_type() == game_type)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        debug!(count = matching.len(), "Listed sessions");
        Ok(matching)
    }
}
