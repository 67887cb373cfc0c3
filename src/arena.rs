//! Wires stores, rules, sanitizer, synchronizer and agent into one service graph.

use crate::agent::{AgentTurn, HeuristicSelector, MoveSelector};
use crate::config::{ArenaConfig, StorageBackend};
use crate::games::{GameOptions, RulesEngine};
use crate::http::{self, AppState};
use crate::mcp::ArenaMcpServer;
use crate::orchestrator::GameOrchestrator;
use crate::sanitize::SanitizedReader;
use crate::session::Difficulty;
use crate::store::{MemorySessionStore, SharedStore, SqliteSessionStore};
use crate::sync::{TurnSynchronizer, WaitSettings};
use anyhow::Result;
use axum::Router;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager,
    tower::{StreamableHttpServerConfig, StreamableHttpService},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The assembled services. Cloning shares the same store.
#[derive(Debug, Clone)]
pub struct Arena {
    orchestrator: GameOrchestrator,
    reader: SanitizedReader,
    synchronizer: TurnSynchronizer,
    agent: AgentTurn,
    wait: WaitSettings,
}

impl Arena {
    /// Builds the graph over a store.
    pub fn new(
        store: SharedStore,
        options: GameOptions,
        default_difficulty: Difficulty,
        wait: WaitSettings,
        selector: Arc<dyn MoveSelector>,
    ) -> Self {
        let orchestrator = GameOrchestrator::new(store.clone(), RulesEngine::new())
            .with_options(options)
            .with_default_difficulty(default_difficulty);
        let reader = SanitizedReader::new(store);
        let synchronizer = TurnSynchronizer::new(reader.clone());
        let agent = AgentTurn::new(orchestrator.clone(), reader.clone(), selector);
        Self {
            orchestrator,
            reader,
            synchronizer,
            agent,
            wait,
        }
    }

    /// Default settings over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemorySessionStore::new()),
            GameOptions::default(),
            Difficulty::default(),
            WaitSettings::default(),
            Arc::new(HeuristicSelector::new()),
        )
    }

    /// Builds the graph described by a configuration.
    ///
    /// # Errors
    ///
    /// Fails if the wait settings are invalid or the SQLite store cannot be
    /// opened.
    #[instrument(skip(config), fields(backend = %config.storage.backend))]
    pub fn from_config(config: &ArenaConfig) -> Result<Self> {
        let wait = config.wait.settings()?;
        let store: SharedStore = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemorySessionStore::new()),
            StorageBackend::Sqlite => Arc::new(SqliteSessionStore::open(&config.storage.sqlite_path)?),
        };
        info!(
            difficulty = %config.games.default_difficulty,
            max_rounds = config.games.max_rounds,
            "Arena assembled"
        );
        Ok(Self::new(
            store,
            config.games.options(),
            config.games.default_difficulty,
            wait,
            Arc::new(HeuristicSelector::new()),
        ))
    }

    /// The orchestrator.
    pub fn orchestrator(&self) -> &GameOrchestrator {
        &self.orchestrator
    }

    /// The sanitized reader.
    pub fn reader(&self) -> &SanitizedReader {
        &self.reader
    }

    /// The turn synchronizer.
    pub fn synchronizer(&self) -> &TurnSynchronizer {
        &self.synchronizer
    }

    /// The server-side agent.
    pub fn agent(&self) -> &AgentTurn {
        &self.agent
    }

    /// A fresh MCP handler over the shared services.
    pub fn mcp_server(&self) -> ArenaMcpServer {
        ArenaMcpServer::new(
            self.orchestrator.clone(),
            self.reader.clone(),
            self.synchronizer.clone(),
            self.wait,
        )
    }

    /// The REST routes alone.
    pub fn rest_router(&self) -> Router {
        http::router(AppState::new(
            self.orchestrator.clone(),
            self.reader.clone(),
            self.synchronizer.clone(),
            self.agent.clone(),
            self.wait,
        ))
    }

    /// REST routes plus MCP over streamable HTTP at `/mcp`.
    pub fn router(&self) -> Router {
        let arena = self.clone();
        let mcp = StreamableHttpService::new(
            move || {
                debug!("Creating MCP handler for new session");
                Ok(arena.mcp_server())
            },
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig::default(),
        );
        self.rest_router().nest_service("/mcp", mcp)
    }
}
