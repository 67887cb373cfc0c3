//! The automated opponent.
//!
//! A [`MoveSelector`] only ever sees a [`SanitizedSession`]. Its move goes back
//! through the [`GameOrchestrator`] like any human move, so an agent moving out
//! of turn is rejected by the same rules.

mod client;
mod heuristic;

pub use client::{AgentRunSummary, HttpAgentClient};
pub use heuristic::HeuristicSelector;

use crate::error::GameError;
use crate::games::{GameMove, GameType, PlayerId};
use crate::orchestrator::GameOrchestrator;
use crate::sanitize::{SanitizedReader, SanitizedSession};
use crate::session::Difficulty;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

/// Chooses the agent's next move from what the agent is allowed to see.
#[async_trait]
pub trait MoveSelector: Send + Sync + std::fmt::Debug {
    /// Proposes a move. The move is validated by the caller, not here.
    async fn choose_move(
        &self,
        session: &SanitizedSession,
        difficulty: Difficulty,
    ) -> Result<GameMove, GameError>;
}

/// Plays one agent move on the server side: read the sanitized view, choose,
/// submit as the agent seat.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    orchestrator: GameOrchestrator,
    reader: SanitizedReader,
    selector: Arc<dyn MoveSelector>,
}

impl AgentTurn {
    /// Creates an agent turn runner.
    pub fn new(
        orchestrator: GameOrchestrator,
        reader: SanitizedReader,
        selector: Arc<dyn MoveSelector>,
    ) -> Self {
        Self {
            orchestrator,
            reader,
            selector,
        }
    }

    /// Makes the agent's move and returns the agent's view of the result.
    ///
    /// # Errors
    ///
    /// [`GameError::NotFound`], [`GameError::Agent`] if the selector cannot
    /// move, or [`GameError::InvalidMove`] if its move is refused.
    #[instrument(skip(self))]
    pub async fn play(&self, game_type: GameType, id: &str) -> Result<SanitizedSession, GameError> {
        let view = self.reader.get(game_type, id).await?;
        let difficulty = view.difficulty_or_default();
        let mv = self.selector.choose_move(&view, difficulty).await?;
        info!(%mv, %difficulty, "Agent moving");
        let session = self
            .orchestrator
            .apply_move(game_type, id, PlayerId::Ai, mv)
            .await?;
        Ok(SanitizedSession::from(session))
    }
}
