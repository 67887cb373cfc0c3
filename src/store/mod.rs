//! Session persistence.
//!
//! The core depends only on [`SessionStore`]; backends are chosen at startup.

mod error;
mod memory;
mod models;
mod schema;
mod sqlite;

pub use error::StoreError;
pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use crate::games::GameType;
use crate::session::GameSession;
use async_trait::async_trait;
use std::sync::Arc;

/// Key-value store of game sessions, keyed by game id.
///
/// Writes replace the whole document; a session is never partially written.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Loads a session, or `None` if the id is unknown.
    async fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError>;

    /// Stores a session under the id, replacing any previous document.
    async fn set(&self, id: &str, session: &GameSession) -> Result<(), StoreError>;

    /// Removes a session. Returns true if one was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// All sessions of a game type, most recently updated first.
    async fn list_by_type(&self, game_type: GameType) -> Result<Vec<GameSession>, StoreError>;
}

/// Shared handle to the configured store.
pub type SharedStore = Arc<dyn SessionStore>;
