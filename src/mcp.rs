//! MCP tools for an automated agent.
//!
//! Every tool reads through the sanitized path. Moves are always submitted as
//! the `ai` seat, and the reply is the agent's view of the result.

use crate::error::{ErrorKind, GameError};
use crate::games::{GameMove, GameType, PlayerId};
use crate::orchestrator::GameOrchestrator;
use crate::sanitize::{SanitizedReader, SanitizedSession};
use crate::sync::{TurnSynchronizer, WaitRequest, WaitSettings};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Request naming a game type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListGamesRequest {
    /// Game type: "tictactoe" or "rps".
    pub game_type: GameType,
}

/// Request naming one game.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GameRef {
    /// Game type: "tictactoe" or "rps".
    pub game_type: GameType,
    /// Game id.
    pub game_id: String,
}

/// Request for waiting on the opponent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WaitForMoveRequest {
    /// Game type: "tictactoe" or "rps".
    pub game_type: GameType,
    /// Game id.
    pub game_id: String,
    /// Longest wait in seconds. Defaults to 30.
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
    /// Seconds between polls. Defaults to 1.
    #[serde(default)]
    pub poll_interval_seconds: Option<f64>,
}

/// Request for the legal moves of a seat.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidMovesRequest {
    /// Game type: "tictactoe" or "rps".
    pub game_type: GameType,
    /// Game id.
    pub game_id: String,
    /// Seat to ask about. Defaults to "ai".
    #[serde(default)]
    pub player_id: Option<String>,
}

/// Request for making a move as the agent seat.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MakeMoveRequest {
    /// Game type: "tictactoe" or "rps".
    pub game_type: GameType,
    /// Game id.
    pub game_id: String,
    /// `{"row": 0-2, "col": 0-2}` for tic-tac-toe, `{"choice": "rock"}` for rps.
    #[serde(rename = "move")]
    pub mv: serde_json::Value,
}

/// Maps a game error onto an MCP error, keeping the category in `data`.
fn to_mcp_error(err: GameError) -> McpError {
    let data = Some(serde_json::json!({ "error": err.kind() }));
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::InvalidMove | ErrorKind::MalformedInput => {
            debug!(error = %err, "Tool call rejected");
            McpError::invalid_params(err.to_string(), data)
        }
        ErrorKind::Storage | ErrorKind::Agent => {
            warn!(error = %err, "Tool call failed");
            McpError::internal_error(err.to_string(), data)
        }
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Failed to encode result: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// MCP server handler for the agent seat.
#[derive(Clone)]
pub struct ArenaMcpServer {
    orchestrator: GameOrchestrator,
    reader: SanitizedReader,
    synchronizer: TurnSynchronizer,
    wait: WaitSettings,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for ArenaMcpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaMcpServer")
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

#[tool_router]
impl ArenaMcpServer {
    /// Creates a server over shared services.
    #[instrument(skip_all)]
    pub fn new(
        orchestrator: GameOrchestrator,
        reader: SanitizedReader,
        synchronizer: TurnSynchronizer,
        wait: WaitSettings,
    ) -> Self {
        info!("Creating arena MCP server");
        Self {
            orchestrator,
            reader,
            synchronizer,
            wait,
            tool_router: Self::tool_router(),
        }
    }

    /// Lists games of a type, sanitized.
    #[instrument(skip(self, req), fields(game_type = %req.game_type))]
    #[tool(description = "List all games of a type (tictactoe or rps). Choices in unfinished rounds are hidden.")]
    pub async fn list_games(
        &self,
        Parameters(req): Parameters<ListGamesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let sessions = self.reader.list(req.game_type).await.map_err(to_mcp_error)?;
        debug!(count = sessions.len(), "Listed games");
        json_result(&sessions)
    }

    /// Reads one game, sanitized.
    #[instrument(skip(self, req), fields(game_type = %req.game_type, game_id = %req.game_id))]
    #[tool(description = "Get the current state of one game as the agent sees it.")]
    pub async fn get_game(
        &self,
        Parameters(req): Parameters<GameRef>,
    ) -> Result<CallToolResult, McpError> {
        let session = self
            .reader
            .get(req.game_type, &req.game_id)
            .await
            .map_err(to_mcp_error)?;
        json_result(&session)
    }

    /// Blocks until the opponent moves or the game ends.
    #[instrument(skip(self, context, req), fields(game_type = %req.game_type, game_id = %req.game_id))]
    #[tool(description = "Wait until the human opponent moves, the game ends, or the timeout passes. Returns a status (already_finished, not_my_turn, move_detected, finished_during_wait, timed_out, cancelled) and the latest state.")]
    pub async fn wait_for_move(
        &self,
        context: RequestContext<RoleServer>,
        Parameters(req): Parameters<WaitForMoveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let (timeout, poll_interval) = self
            .wait
            .resolve(req.timeout_seconds, req.poll_interval_seconds)
            .map_err(to_mcp_error)?;
        let request = WaitRequest::new(req.game_type, req.game_id)
            .with_timeout(timeout)
            .with_poll_interval(poll_interval);
        let outcome = self
            .synchronizer
            .wait_for_move(&request, &context.ct)
            .await
            .map_err(to_mcp_error)?;
        info!(status = %outcome.status, polls = outcome.polls, "Wait finished");
        json_result(&outcome)
    }

    /// Lists the legal moves of a seat.
    #[instrument(skip(self, req), fields(game_type = %req.game_type, game_id = %req.game_id))]
    #[tool(description = "List the moves a player could make right now. Empty when it is not that player's turn.")]
    pub async fn valid_moves(
        &self,
        Parameters(req): Parameters<ValidMovesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let player_id = req.player_id.as_deref().unwrap_or("ai");
        let moves = self
            .orchestrator
            .valid_moves(req.game_type, &req.game_id, player_id)
            .await
            .map_err(to_mcp_error)?;
        json_result(&moves)
    }

    /// Submits a move and returns the agent's view of the result.
    #[instrument(skip(self, req), fields(game_type = %req.game_type, game_id = %req.game_id))]
    #[tool(description = "Make a move as the 'ai' seat. Tic-tac-toe: {\"row\": 0-2, \"col\": 0-2}. Rock-paper-scissors: {\"choice\": \"rock\" | \"paper\" | \"scissors\"}.")]
    pub async fn make_move(
        &self,
        Parameters(req): Parameters<MakeMoveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mv = GameMove::parse(req.game_type, req.mv).map_err(to_mcp_error)?;
        let session = self
            .orchestrator
            .apply_move(req.game_type, &req.game_id, PlayerId::Ai, mv)
            .await
            .map_err(to_mcp_error)?;
        info!(status = %session.status(), "Agent move accepted");
        json_result(&SanitizedSession::from(session))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for ArenaMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Arena for tic-tac-toe and rock-paper-scissors. You play the 'ai' seat. \
                 Call wait_for_move, then get_game and make_move when it is your turn."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::orchestrator::CreateGameRequest;
    use serde_json::{Value, json};

    fn result_json(result: &CallToolResult) -> Value {
        let raw = serde_json::to_value(result).expect("Result should serialize");
        let text = raw["content"][0]["text"]
            .as_str()
            .expect("Expected text content")
            .to_string();
        serde_json::from_str(&text).expect("Tool text should be JSON")
    }

    #[tokio::test]
    async fn make_move_returns_sanitized_view() {
        let arena = Arena::in_memory();
        let server = arena.mcp_server();
        let game = arena
            .orchestrator()
            .create_game(GameType::RockPaperScissors, CreateGameRequest::new("Ada"))
            .await
            .expect("Create failed");
        let id = game.id().to_string();
        arena
            .orchestrator()
            .submit_move(GameType::RockPaperScissors, &id, "player1", json!({ "choice": "scissors" }))
            .await
            .expect("Human choice failed");

        let result = server
            .make_move(Parameters(MakeMoveRequest {
                game_type: GameType::RockPaperScissors,
                game_id: id.clone(),
                mv: json!({ "choice": "rock" }),
            }))
            .await
            .expect("Move failed");
        let view = result_json(&result);
        assert_eq!(view["game"]["state"]["currentPlayerId"], "player1");
        assert_eq!(view["history"][1]["playerId"], "ai");

        // The human's next choice stays hidden from the agent.
        arena
            .orchestrator()
            .submit_move(GameType::RockPaperScissors, &id, "player1", json!({ "choice": "paper" }))
            .await
            .expect("Human choice failed");
        let result = server
            .get_game(Parameters(GameRef {
                game_type: GameType::RockPaperScissors,
                game_id: id.clone(),
            }))
            .await
            .expect("Get failed");
        assert!(!result_json(&result).to_string().contains("paper"));

        let result = server
            .valid_moves(Parameters(ValidMovesRequest {
                game_type: GameType::RockPaperScissors,
                game_id: id,
                player_id: Some("player1".to_string()),
            }))
            .await
            .expect("Valid moves failed");
        assert_eq!(result_json(&result), json!([]));
    }

    #[tokio::test]
    async fn make_move_always_plays_the_agent_seat() {
        let arena = Arena::in_memory();
        let server = arena.mcp_server();
        let game = arena
            .orchestrator()
            .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
            .await
            .expect("Create failed");

        // A seat named by the caller is ignored; the agent is not on move.
        let req: MakeMoveRequest = serde_json::from_value(json!({
            "game_type": "tictactoe",
            "game_id": game.id(),
            "player_id": "player1",
            "move": { "row": 2, "col": 2 }
        }))
        .expect("Request should parse");
        let err = server.make_move(Parameters(req)).await.unwrap_err();
        assert_eq!(err.data, Some(json!({ "error": "invalid_move" })));

        let session = arena
            .orchestrator()
            .get_session(GameType::TicTacToe, game.id())
            .await
            .expect("Get failed");
        assert!(session.history.is_empty());
        assert_eq!(session.current_player_id(), PlayerId::Player1);

        arena
            .orchestrator()
            .submit_move(GameType::TicTacToe, game.id(), "player1", json!({ "row": 0, "col": 0 }))
            .await
            .expect("Human move failed");
        server
            .make_move(Parameters(MakeMoveRequest {
                game_type: GameType::TicTacToe,
                game_id: game.id().to_string(),
                mv: json!({ "row": 2, "col": 2 }),
            }))
            .await
            .expect("Agent move failed");
        let session = arena
            .orchestrator()
            .get_session(GameType::TicTacToe, game.id())
            .await
            .expect("Get failed");
        let seats: Vec<PlayerId> = session.history.iter().map(|r| r.player_id).collect();
        assert_eq!(seats, vec![PlayerId::Player1, PlayerId::Ai]);
    }

    #[tokio::test]
    async fn errors_carry_their_category() {
        let arena = Arena::in_memory();
        let server = arena.mcp_server();
        let err = server
            .get_game(Parameters(GameRef {
                game_type: GameType::TicTacToe,
                game_id: "missing".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.data, Some(json!({ "error": "not_found" })));
    }

    #[test]
    fn agent_failures_are_internal_errors() {
        let invalid = to_mcp_error(GameError::malformed("bad"));
        let internal = to_mcp_error(GameError::agent("stuck"));
        assert_ne!(invalid.code, internal.code);
        assert_eq!(internal.data, Some(json!({ "error": "agent" })));
    }
}
