//! Command-line interface for strictly_arena.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strictly_arena::{GameType, StorageBackend};

/// Strictly Arena - human vs. agent games with sanitized agent views
#[derive(Parser, Debug)]
#[command(name = "strictly_arena")]
#[command(about = "Tic-tac-toe and rock-paper-scissors against an automated agent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config (defaults to ./arena.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the REST API with MCP mounted at /mcp
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Session storage backend
        #[arg(long, value_enum)]
        storage: Option<StorageBackend>,

        /// SQLite database file
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Run the MCP server over stdio
    Mcp {
        /// Session storage backend
        #[arg(long, value_enum)]
        storage: Option<StorageBackend>,

        /// SQLite database file
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Play the agent seat of one game against a running server
    Agent {
        /// Arena server URL
        #[arg(long)]
        server_url: Option<String>,

        /// Game type (tictactoe or rps)
        #[arg(long)]
        game_type: Option<GameType>,

        /// Game to join
        #[arg(long)]
        game_id: Option<String>,

        /// Seconds between server-side polls
        #[arg(long)]
        poll_interval: Option<f64>,
    },
}
