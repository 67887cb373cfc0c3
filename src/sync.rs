//! Turn synchronization for a stateless, polling agent.
//!
//! The agent asks "wake me when it is my move". [`TurnSynchronizer`] answers by
//! polling the sanitized view until the game changes, finishes, or the deadline
//! passes. Every poll reads through [`SanitizedReader`], so nothing returned
//! here ever carries an in-flight choice.

use crate::error::GameError;
use crate::games::{GameStatus, GameType};
use crate::sanitize::{SanitizedReader, SanitizedSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Default time an agent waits for a move.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on any requested wait.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How a wait ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WaitStatus {
    /// The game was already over at the first check.
    AlreadyFinished,
    /// It was the agent's turn at the first check, so there was nothing to wait for.
    NotMyTurn,
    /// The game changed since the wait began.
    MoveDetected,
    /// The game was marked finished without a visible move.
    FinishedDuringWait,
    /// The deadline passed with no change.
    TimedOut,
    /// The caller gave up.
    Cancelled,
}

/// What to wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitRequest {
    /// Game variant.
    pub game_type: GameType,
    /// Game id.
    pub game_id: String,
    /// Longest time to wait.
    pub timeout: Duration,
    /// Delay between polls.
    pub poll_interval: Duration,
}

impl WaitRequest {
    /// Creates a request with default timing.
    pub fn new(game_type: GameType, game_id: impl Into<String>) -> Self {
        Self {
            game_type,
            game_id: game_id.into(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Defaults and limits applied to wire-level wait parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    /// Timeout when the caller names none.
    pub default_timeout: Duration,
    /// Requested timeouts are clamped to this.
    pub max_timeout: Duration,
    /// Poll interval when the caller names none.
    pub default_poll_interval: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            max_timeout: MAX_TIMEOUT,
            default_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitSettings {
    /// Turns optional second counts into a timeout and poll interval.
    ///
    /// # Errors
    ///
    /// [`GameError::MalformedInput`] if either value is not a positive, finite
    /// number.
    pub fn resolve(
        &self,
        timeout_secs: Option<f64>,
        poll_interval_secs: Option<f64>,
    ) -> Result<(Duration, Duration), GameError> {
        let timeout = match timeout_secs {
            Some(secs) => positive_secs("timeout", secs)?.min(self.max_timeout),
            None => self.default_timeout,
        };
        let poll_interval = match poll_interval_secs {
            Some(secs) => positive_secs("pollInterval", secs)?,
            None => self.default_poll_interval,
        };
        Ok((timeout, poll_interval))
    }
}

fn positive_secs(name: &str, secs: f64) -> Result<Duration, GameError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(GameError::malformed(format!(
            "{} must be a positive number of seconds, got {}",
            name, secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| GameError::malformed(format!("{} is out of range: {}", name, e)))
}

/// Terminal result of a wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitOutcome {
    /// Game id.
    pub game_id: String,
    /// Game variant.
    pub game_type: GameType,
    /// How the wait ended.
    pub status: WaitStatus,
    /// Human-readable summary.
    pub message: String,
    /// Last sanitized state seen.
    pub state: SanitizedSession,
    /// Time spent waiting. Absent when the wait returned without sleeping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waited_seconds: Option<f64>,
    /// Number of polls after the initial read.
    pub polls: u32,
}

impl WaitOutcome {
    fn new(
        status: WaitStatus,
        message: impl Into<String>,
        state: SanitizedSession,
        waited: Option<Duration>,
        polls: u32,
    ) -> Self {
        Self {
            game_id: state.id().to_string(),
            game_type: state.game_type(),
            status,
            message: message.into(),
            state,
            waited_seconds: waited.map(|d| d.as_secs_f64()),
            polls,
        }
    }
}

/// Polls a game until the agent has something to do.
#[derive(Debug, Clone)]
pub struct TurnSynchronizer {
    reader: SanitizedReader,
}

impl TurnSynchronizer {
    /// Creates a synchronizer reading through the given reader.
    pub fn new(reader: SanitizedReader) -> Self {
        Self { reader }
    }

    /// Waits until the opponent moves, the game ends, the deadline passes, or
    /// the token is cancelled.
    ///
    /// Returns immediately, without polling, when the game is already over or
    /// it is already the agent's turn.
    ///
    /// # Errors
    ///
    /// [`GameError::NotFound`] if the game is missing at the first check or
    /// disappears while waiting; [`GameError::Storage`] if a read fails.
    #[instrument(skip(self, request, cancel), fields(game_id = %request.game_id, game_type = %request.game_type))]
    pub async fn wait_for_move(
        &self,
        request: &WaitRequest,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, GameError> {
        let initial = self.reader.get(request.game_type, &request.game_id).await?;

        if initial.status() == GameStatus::Finished {
            debug!("Game already finished");
            return Ok(WaitOutcome::new(
                WaitStatus::AlreadyFinished,
                finished_message(&initial),
                initial,
                None,
                0,
            ));
        }
        if !initial.current_player_id().is_human() {
            debug!("Agent is already on move");
            return Ok(WaitOutcome::new(
                WaitStatus::NotMyTurn,
                "It is already your turn",
                initial,
                None,
                0,
            ));
        }

        let baseline = initial.updated_at();
        let started = Instant::now();
        let mut last = initial;
        let mut polls = 0u32;

        loop {
            let waited = started.elapsed();
            if waited >= request.timeout {
                info!(polls, waited_ms = waited.as_millis() as u64, "Wait timed out");
                return Ok(WaitOutcome::new(
                    WaitStatus::TimedOut,
                    format!(
                        "No move within {:.1} seconds",
                        request.timeout.as_secs_f64()
                    ),
                    last,
                    Some(waited),
                    polls,
                ));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(polls, "Wait cancelled");
                    return Ok(WaitOutcome::new(
                        WaitStatus::Cancelled,
                        "Wait cancelled",
                        last,
                        Some(started.elapsed()),
                        polls,
                    ));
                }
                _ = tokio::time::sleep(request.poll_interval) => {}
            }

            let current = self.reader.get(request.game_type, &request.game_id).await?;
            polls += 1;

            // A changed updatedAt takes precedence over a finished status.
            if has_changed(baseline, current.updated_at()) {
                info!(polls, status = %current.status(), "Opponent moved");
                let message = match current.status() {
                    GameStatus::Finished => format!("Opponent moved. {}", finished_message(&current)),
                    _ => format!("Opponent moved; {} to play", current.current_player_id()),
                };
                return Ok(WaitOutcome::new(
                    WaitStatus::MoveDetected,
                    message,
                    current,
                    Some(started.elapsed()),
                    polls,
                ));
            }
            if current.status() == GameStatus::Finished {
                info!(polls, "Game finished while waiting");
                return Ok(WaitOutcome::new(
                    WaitStatus::FinishedDuringWait,
                    finished_message(&current),
                    current,
                    Some(started.elapsed()),
                    polls,
                ));
            }
            last = current;
        }
    }
}

fn has_changed(baseline: DateTime<Utc>, current: DateTime<Utc>) -> bool {
    current != baseline
}

fn finished_message(session: &SanitizedSession) -> String {
    match session.base().winner {
        Some(winner) => format!("Game over: {}", winner),
        None => "Game over".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_applies_defaults_and_clamp() {
        let settings = WaitSettings::default();
        let (timeout, poll) = settings.resolve(None, None).unwrap();
        assert_eq!(timeout, DEFAULT_TIMEOUT);
        assert_eq!(poll, DEFAULT_POLL_INTERVAL);

        let (timeout, poll) = settings.resolve(Some(10_000.0), Some(0.25)).unwrap();
        assert_eq!(timeout, MAX_TIMEOUT);
        assert_eq!(poll, Duration::from_millis(250));
    }

    #[test]
    fn resolve_rejects_non_positive_values() {
        let settings = WaitSettings::default();
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = settings.resolve(Some(bad), None).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::MalformedInput);
            let err = settings.resolve(None, Some(bad)).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::MalformedInput);
        }
    }

    #[test]
    fn wait_status_tags() {
        assert_eq!(WaitStatus::AlreadyFinished.to_string(), "already_finished");
        assert_eq!(
            serde_json::to_value(WaitStatus::FinishedDuringWait).unwrap(),
            "finished_during_wait"
        );
    }
}
