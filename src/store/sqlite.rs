//! SQLite-backed session store.

use super::models::SessionRow;
use super::{SessionStore, StoreError, schema};
use crate::games::GameType;
use crate::session::GameSession;
use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Stores each session as one JSON document row.
///
/// Every operation opens its own connection on the blocking pool. In-memory
/// databases (`":memory:"`) are not supported because each connection would see
/// a different database.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    db_path: String,
}

impl SqliteSessionStore {
    /// Opens the database at the given path, creating it and applying
    /// migrations as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, StoreError> {
        let store = Self {
            db_path: db_path.as_ref().to_string(),
        };
        let mut conn = store.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::new(format!("Migrations failed: {}", e)))?;
        info!(path = %store.db_path, migrations = applied.len(), "Opened SQLite session store");
        Ok(store)
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, StoreError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path).map_err(|e| {
            StoreError::new(format!("Failed to connect to '{}': {}", self.db_path, e))
        })?;
        conn.batch_execute("PRAGMA busy_timeout = 5000;")?;
        Ok(conn)
    }

    /// Runs a blocking query on its own connection.
    async fn with_connection<T, F>(&self, query: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = store.connection()?;
            query(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError> {
        let id = id.to_string();
        let row = self
            .with_connection(move |conn| {
                Ok(schema::game_sessions::table
                    .find(id)
                    .select(SessionRow::as_select())
                    .first(conn)
                    .optional()?)
            })
            .await?;
        row.map(|r| r.decode()).transpose()
    }

    #[instrument(skip(self, session), fields(game_type = %session.game_type()))]
    async fn set(&self, id: &str, session: &GameSession) -> Result<(), StoreError> {
        let row = SessionRow::encode(id, session)?;
        self.with_connection(move |conn| {
            diesel::replace_into(schema::game_sessions::table)
                .values(&row)
                .execute(conn)?;
            debug!(session_id = %row.id(), "Session stored");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let key = id.to_string();
        let removed = self
            .with_connection(move |conn| {
                Ok(diesel::delete(schema::game_sessions::table.find(key)).execute(conn)?)
            })
            .await?;
        info!(session_id = id, removed, "Session deleted");
        Ok(removed > 0)
    }

    #[instrument(skip(self))]
    async fn list_by_type(&self, game_type: GameType) -> Result<Vec<GameSession>, StoreError> {
        let tag = game_type.to_string();
        let rows = self
            .with_connection(move |conn| {
                Ok(schema::game_sessions::table
                    .filter(schema::game_sessions::game_type.eq(tag))
                    .order(schema::game_sessions::updated_at.desc())
                    .select(SessionRow::as_select())
                    .load(conn)?)
            })
            .await?;
        debug!(count = rows.len(), "Listed sessions");
        rows.iter().map(SessionRow::decode).collect()
    }
}
