//! Strictly Arena - Unified CLI
//!
//! Serves the arena over REST and MCP, or plays the agent seat as a client.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use rmcp::ServiceExt;
use std::sync::Arc;
use strictly_arena::{Arena, ArenaConfig, HeuristicSelector, HttpAgentClient, StorageBackend};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,strictly_arena=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let stdio = matches!(cli.command, Command::Mcp { .. });
    initialize_tracing(stdio);

    let mut config = ArenaConfig::load(cli.config.clone())?;

    match cli.command {
        Command::Serve {
            port,
            host,
            storage,
            db_path,
        } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            apply_storage_overrides(&mut config, storage, db_path);
            run_server(config).await
        }
        Command::Mcp { storage, db_path } => {
            apply_storage_overrides(&mut config, storage, db_path);
            run_stdio_mcp(config).await
        }
        Command::Agent {
            server_url,
            game_type,
            game_id,
            poll_interval,
        } => {
            if let Some(url) = server_url {
                config.agent.server_url = url;
            }
            if let Some(game_type) = game_type {
                config.agent.game_type = game_type;
            }
            if game_id.is_some() {
                config.agent.game_id = game_id;
            }
            if let Some(secs) = poll_interval {
                config.agent.poll_interval_secs = secs;
            }
            run_agent(config).await
        }
    }
}

fn apply_storage_overrides(
    config: &mut ArenaConfig,
    storage: Option<StorageBackend>,
    db_path: Option<String>,
) {
    if let Some(backend) = storage {
        config.storage.backend = backend;
    }
    if let Some(path) = db_path {
        config.storage.sqlite_path = path;
    }
}

/// Runs REST plus MCP over streamable HTTP.
#[instrument(skip(config), fields(host = %config.server.host, port = config.server.port))]
async fn run_server(config: ArenaConfig) -> Result<()> {
    let arena = Arena::from_config(&config)?;
    let app = arena.router();

    let addr = (config.server.host.as_str(), config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    info!(
        "Arena ready at http://{}:{}/ (REST under /api, MCP at /mcp)",
        config.server.host, config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Runs the MCP server over stdio. Logs go to stderr.
#[instrument(skip(config))]
async fn run_stdio_mcp(config: ArenaConfig) -> Result<()> {
    info!("Starting arena MCP server on stdio");
    let arena = Arena::from_config(&config)?;
    let service = arena.mcp_server().serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Plays the agent seat of one game.
#[instrument(skip(config), fields(server_url = %config.agent.server_url, game_type = %config.agent.game_type))]
async fn run_agent(config: ArenaConfig) -> Result<()> {
    let game_id = config
        .agent
        .game_id
        .clone()
        .context("No game to join: pass --game-id or set agent.game_id")?;
    let client = HttpAgentClient::new(
        config.agent.server_url.clone(),
        config.agent.game_type,
        game_id,
        Arc::new(HeuristicSelector::new()),
    )
    .with_wait_timeout(config.agent.wait_timeout()?)
    .with_poll_interval(config.agent.poll_interval()?);

    tokio::select! {
        summary = client.run() => {
            let summary = summary?;
            info!(
                moves = summary.moves_made,
                winner = ?summary.final_state.base().winner,
                "Agent finished"
            );
        }
        _ = shutdown_signal() => info!("Agent interrupted"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn initialize_tracing(stdio: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if stdio {
        // stdout carries the MCP protocol
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
