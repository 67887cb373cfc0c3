//! Database row models.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use diesel::prelude::*;
use tracing::instrument;

use super::{StoreError, schema};
use crate::session::GameSession;

/// One persisted session: the JSON document plus columns used for lookups.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Getters)]
#[diesel(table_name = schema::game_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SessionRow {
    id: String,
    game_type: String,
    document: String,
    updated_at: NaiveDateTime,
}

impl SessionRow {
    /// Serializes a session into a row.
    #[instrument(skip(session), fields(game_type = %session.game_type()))]
    pub fn encode(id: &str, session: &GameSession) -> Result<Self, StoreError> {
        Ok(Self {
            id: id.to_string(),
            game_type: session.game_type().to_string(),
            document: serde_json::to_string(session)?,
            updated_at: session.updated_at().naive_utc(),
        })
    }

    /// Parses the stored document.
    #[instrument(skip(self), fields(id = %self.id))]
    pub fn decode(&self) -> Result<GameSession, StoreError> {
        Ok(serde_json::from_str(&self.document)?)
    }
}
