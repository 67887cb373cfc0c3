//! External agent that plays over the REST API.
//!
//! The client holds no game state between turns. Each turn it waits on the
//! server, reads the sanitized list, asks its selector for a move and submits
//! it as the `ai` seat.

use super::MoveSelector;
use crate::games::{GameStatus, GameType, PlayerId};
use crate::http::{ErrorBody, MoveBody, WaitBody};
use crate::sanitize::SanitizedSession;
use crate::sync::{WaitOutcome, WaitStatus};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// What happened over one agent run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRunSummary {
    /// Moves the agent submitted.
    pub moves_made: u32,
    /// Final state as the agent saw it.
    pub final_state: SanitizedSession,
}

/// REST client driving the agent seat of one game.
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    base_url: String,
    client: reqwest::Client,
    game_type: GameType,
    game_id: String,
    wait_timeout: Duration,
    poll_interval: Duration,
    selector: Arc<dyn MoveSelector>,
}

impl HttpAgentClient {
    /// Creates a client for one game.
    pub fn new(
        base_url: impl Into<String>,
        game_type: GameType,
        game_id: impl Into<String>,
        selector: Arc<dyn MoveSelector>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            game_type,
            game_id: game_id.into(),
            wait_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            selector,
        }
    }

    /// Sets the server-side wait timeout per request.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Sets the poll interval the server uses while waiting.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn game_url(&self, suffix: &str) -> String {
        format!(
            "{}/api/games/{}/{}{}",
            self.base_url, self.game_type, self.game_id, suffix
        )
    }

    /// Plays until the game is over.
    #[instrument(skip(self), fields(game_type = %self.game_type, game_id = %self.game_id))]
    pub async fn run(&self) -> Result<AgentRunSummary> {
        info!(base_url = %self.base_url, "Agent joining game");
        let mut moves_made = 0;

        loop {
            let outcome = self.wait().await?;
            debug!(status = %outcome.status, polls = outcome.polls, "Wait returned");

            match outcome.status {
                WaitStatus::AlreadyFinished | WaitStatus::FinishedDuringWait => {
                    return Ok(self.finish(moves_made, outcome.state));
                }
                WaitStatus::TimedOut | WaitStatus::Cancelled => continue,
                WaitStatus::MoveDetected | WaitStatus::NotMyTurn => {}
            }
            if outcome.state.status() == GameStatus::Finished {
                return Ok(self.finish(moves_made, outcome.state));
            }

            let view = self.read_view().await?;
            if view.current_player_id() != PlayerId::Ai {
                debug!("Not on move after wake-up, waiting again");
                continue;
            }

            let mv = self
                .selector
                .choose_move(&view, view.difficulty_or_default())
                .await?;
            self.submit(serde_json::to_value(mv)?).await?;
            moves_made += 1;
            info!(%mv, moves_made, "Agent moved");
        }
    }

    fn finish(&self, moves_made: u32, final_state: SanitizedSession) -> AgentRunSummary {
        info!(
            moves_made,
            winner = ?final_state.base().winner,
            "Game over"
        );
        AgentRunSummary {
            moves_made,
            final_state,
        }
    }

    async fn wait(&self) -> Result<WaitOutcome> {
        let body = WaitBody {
            timeout: Some(self.wait_timeout.as_secs_f64()),
            poll_interval: Some(self.poll_interval.as_secs_f64()),
        };
        let response = self
            .client
            .post(self.game_url("/wait"))
            .json(&body)
            .send()
            .await
            .context("Wait request failed")?;
        decode(response).await
    }

    /// Reads this game from the sanitized list.
    async fn read_view(&self) -> Result<SanitizedSession> {
        let url = format!("{}/api/games/{}", self.base_url, self.game_type);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("List request failed")?;
        let sessions: Vec<SanitizedSession> = decode(response).await?;
        sessions
            .into_iter()
            .find(|s| s.id() == self.game_id)
            .with_context(|| format!("Game {} is no longer listed", self.game_id))
    }

    async fn submit(&self, mv: serde_json::Value) -> Result<()> {
        let body = MoveBody {
            player_id: PlayerId::Ai.to_string(),
            mv,
        };
        let response = self
            .client
            .post(self.game_url("/move"))
            .json(&body)
            .send()
            .await
            .context("Move request failed")?;
        // The move route returns the canonical session; the agent never reads it.
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context("Unexpected response body");
    }
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(err) => {
            warn!(%status, kind = %err.error, "Server refused request");
            anyhow::bail!("{} ({}): {}", err.error, status, err.message)
        }
        Err(_) => anyhow::bail!("Server returned {}: {}", status, text),
    }
}
