//! REST surface.
//!
//! The human's client reads canonical sessions and submits moves. The agent
//! reads only through the list and wait routes, which serve sanitized views.

use crate::agent::AgentTurn;
use crate::error::{ErrorKind, GameError};
use crate::games::{GameMove, GameType};
use crate::orchestrator::{CreateGameRequest, GameOrchestrator};
use crate::sanitize::{SanitizedReader, SanitizedSession};
use crate::session::GameSession;
use crate::sync::{TurnSynchronizer, WaitOutcome, WaitRequest, WaitSettings};
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Body of a move submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBody {
    /// Seat making the move.
    pub player_id: String,
    /// The move in the game's wire shape.
    #[serde(rename = "move")]
    pub mv: serde_json::Value,
}

/// Body of a wait request. Both fields are seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitBody {
    /// Longest time to wait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    /// Delay between polls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<f64>,
}

/// Query of the valid-moves route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidMovesQuery {
    /// Seat asking.
    pub player_id: String,
}

/// Response of the valid-moves route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidMovesResponse {
    /// Seat asked about.
    pub player_id: String,
    /// Moves that would be accepted now.
    pub moves: Vec<GameMove>,
}

/// Error payload for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable category.
    pub error: ErrorKind,
    /// Human-readable explanation.
    pub message: String,
}

impl GameError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidMove => StatusCode::CONFLICT,
            ErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
            ErrorKind::Storage | ErrorKind::Agent => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        } else {
            debug!(error = %self, "Request rejected");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Services shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    orchestrator: GameOrchestrator,
    reader: SanitizedReader,
    synchronizer: TurnSynchronizer,
    agent: AgentTurn,
    wait: WaitSettings,
}

impl AppState {
    /// Bundles the services.
    pub fn new(
        orchestrator: GameOrchestrator,
        reader: SanitizedReader,
        synchronizer: TurnSynchronizer,
        agent: AgentTurn,
        wait: WaitSettings,
    ) -> Self {
        Self {
            orchestrator,
            reader,
            synchronizer,
            agent,
            wait,
        }
    }
}

/// Builds the REST router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/games/{game_type}", get(list_games).post(create_game))
        .route(
            "/api/games/{game_type}/{id}",
            get(get_game).delete(delete_game),
        )
        .route("/api/games/{game_type}/{id}/valid-moves", get(valid_moves))
        .route("/api/games/{game_type}/{id}/move", post(submit_move))
        .route("/api/games/{game_type}/{id}/ai-move", post(ai_move))
        .route("/api/games/{game_type}/{id}/wait", post(wait_for_move))
        .with_state(state)
}

fn parse_game_type(raw: &str) -> Result<GameType, GameError> {
    GameType::from_str(raw).map_err(|_| {
        GameError::malformed(format!(
            "Unknown game type '{}' (expected tictactoe or rps)",
            raw
        ))
    })
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, GameError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| GameError::malformed(rejection.body_text()))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Sanitized list: the agent's read path.
#[instrument(skip(state))]
async fn list_games(
    State(state): State<AppState>,
    Path(game_type): Path<String>,
) -> Result<Json<Vec<SanitizedSession>>, GameError> {
    let game_type = parse_game_type(&game_type)?;
    let sessions = state.reader.list(game_type).await?;
    debug!(count = sessions.len(), "Listing sanitized games");
    Ok(Json(sessions))
}

#[instrument(skip(state, body))]
async fn create_game(
    State(state): State<AppState>,
    Path(game_type): Path<String>,
    body: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<Json<GameSession>, GameError> {
    let game_type = parse_game_type(&game_type)?;
    let request = json_body(body)?;
    let session = state.orchestrator.create_game(game_type, request).await?;
    Ok(Json(session))
}

#[instrument(skip(state))]
async fn get_game(
    State(state): State<AppState>,
    Path((game_type, id)): Path<(String, String)>,
) -> Result<Json<GameSession>, GameError> {
    let game_type = parse_game_type(&game_type)?;
    Ok(Json(state.orchestrator.get_session(game_type, &id).await?))
}

#[instrument(skip(state))]
async fn delete_game(
    State(state): State<AppState>,
    Path((game_type, id)): Path<(String, String)>,
) -> Result<StatusCode, GameError> {
    let game_type = parse_game_type(&game_type)?;
    state.orchestrator.delete_session(game_type, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, query))]
async fn valid_moves(
    State(state): State<AppState>,
    Path((game_type, id)): Path<(String, String)>,
    query: Result<Query<ValidMovesQuery>, QueryRejection>,
) -> Result<Json<ValidMovesResponse>, GameError> {
    let game_type = parse_game_type(&game_type)?;
    let Query(query) = query.map_err(|rejection| GameError::malformed(rejection.body_text()))?;
    let moves = state
        .orchestrator
        .valid_moves(game_type, &id, &query.player_id)
        .await?;
    Ok(Json(ValidMovesResponse {
        player_id: query.player_id,
        moves,
    }))
}

/// Returns the canonical session to the submitter.
#[instrument(skip(state, body))]
async fn submit_move(
    State(state): State<AppState>,
    Path((game_type, id)): Path<(String, String)>,
    body: Result<Json<MoveBody>, JsonRejection>,
) -> Result<Json<GameSession>, GameError> {
    let game_type = parse_game_type(&game_type)?;
    let body = json_body(body)?;
    let session = state
        .orchestrator
        .submit_move(game_type, &id, &body.player_id, body.mv)
        .await?;
    info!(player_id = %body.player_id, status = %session.status(), "Move accepted");
    Ok(Json(session))
}

#[instrument(skip(state))]
async fn ai_move(
    State(state): State<AppState>,
    Path((game_type, id)): Path<(String, String)>,
) -> Result<Json<SanitizedSession>, GameError> {
    let game_type = parse_game_type(&game_type)?;
    Ok(Json(state.agent.play(game_type, &id).await?))
}

/// Long-polls until the agent has something to do.
///
/// The token is cancelled when this future is dropped, which is what happens
/// when the client disconnects.
#[instrument(skip(state, body))]
async fn wait_for_move(
    State(state): State<AppState>,
    Path((game_type, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<WaitOutcome>, GameError> {
    let game_type = parse_game_type(&game_type)?;
    let body: WaitBody = if body.is_empty() {
        WaitBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| GameError::malformed(format!("Invalid wait body: {}", e)))?
    };
    let (timeout, poll_interval) = state.wait.resolve(body.timeout, body.poll_interval)?;
    let request = WaitRequest::new(game_type, id)
        .with_timeout(timeout)
        .with_poll_interval(poll_interval);

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let outcome = state.synchronizer.wait_for_move(&request, &cancel).await?;
    info!(status = %outcome.status, polls = outcome.polls, "Wait finished");
    Ok(Json(outcome))
}
