//! Strictly Arena - a human plays turn-based games against an automated agent
//!
//! The agent reaches the games through an untrusted channel and only ever sees
//! a sanitized view: in rock-paper-scissors, the human's choice in an open round
//! is hidden until the round resolves.
//!
//! # Architecture
//!
//! - **Rules**: pure per-game rules behind [`GameRules`], dispatched by [`RulesEngine`]
//! - **Store**: [`SessionStore`] with in-memory and SQLite backends
//! - **Sanitizer**: [`Sanitizer`] and the agent-only [`SanitizedReader`]
//! - **Synchronizer**: [`TurnSynchronizer`] long-polls for the opponent's move
//! - **Orchestrator**: [`GameOrchestrator`] is the only writer of sessions
//! - **Surfaces**: REST ([`http`]) and MCP ([`ArenaMcpServer`])
//!
//! # Example
//!
//! ```no_run
//! use strictly_arena::{Arena, CreateGameRequest, GameType, PlayerId};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let arena = Arena::in_memory();
//! let game = arena
//!     .orchestrator()
//!     .create_game(GameType::TicTacToe, CreateGameRequest::new("Ada"))
//!     .await?;
//! let after = arena
//!     .orchestrator()
//!     .submit_move(GameType::TicTacToe, game.id(), "player1", serde_json::json!({"row": 1, "col": 1}))
//!     .await?;
//! assert_eq!(after.current_player_id(), PlayerId::Ai);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod agent;
mod arena;
mod config;
mod error;
mod games;
mod mcp;
mod orchestrator;
mod sanitize;
mod session;
mod store;
mod sync;

pub mod http;

// Crate-level exports - Game rules
pub use games::{
    BaseState, GameMove, GameOptions, GameResult, GameRules, GameState, GameStatus, GameType,
    MoveError, Player, PlayerId, RulesEngine, Winner, rps, tictactoe,
};

// Crate-level exports - Errors
pub use error::{ErrorKind, GameError};

// Crate-level exports - Sessions
pub use session::{Difficulty, GameSession, MoveRecord};

// Crate-level exports - Storage
pub use store::{MemorySessionStore, SessionStore, SharedStore, SqliteSessionStore, StoreError};

// Crate-level exports - Sanitizer
pub use sanitize::{SanitizedReader, SanitizedSession, Sanitizer};

// Crate-level exports - Turn synchronizer
pub use sync::{
    DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, MAX_TIMEOUT, TurnSynchronizer, WaitOutcome,
    WaitRequest, WaitSettings, WaitStatus,
};

// Crate-level exports - Orchestrator
pub use orchestrator::{AGENT_NAME, CreateGameRequest, GameOrchestrator, SessionGuard, SessionLocks};

// Crate-level exports - Agent
pub use agent::{AgentRunSummary, AgentTurn, HeuristicSelector, HttpAgentClient, MoveSelector};

// Crate-level exports - MCP
pub use mcp::{
    ArenaMcpServer, GameRef, ListGamesRequest, MakeMoveRequest, ValidMovesRequest,
    WaitForMoveRequest,
};

// Crate-level exports - Configuration and wiring
pub use arena::Arena;
pub use config::{
    AgentConfig, ArenaConfig, ConfigError, DEFAULT_CONFIG_FILE, GamesConfig, ServerConfig,
    StorageBackend, StorageConfig, WaitConfig,
};
