//! Arena configuration, loaded from `arena.toml`.
//!
//! Every field has a default, so a missing file or an empty table is valid.
//! Command-line flags override individual values after loading.

use crate::games::tictactoe::Symbol;
use crate::games::{GameOptions, GameType};
use crate::session::Difficulty;
use crate::sync::WaitSettings;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// File read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "arena.toml";

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Where sessions are kept.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; lost on exit.
    #[default]
    Memory,
    /// A SQLite file.
    Sqlite,
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind.
    pub backend: StorageBackend,
    /// Database file for the SQLite backend.
    pub sqlite_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            sqlite_path: "strictly_arena.db".to_string(),
        }
    }
}

/// `[games]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    /// Agent strength when a create request names none.
    pub default_difficulty: Difficulty,
    /// Rock-paper-scissors rounds per game.
    pub max_rounds: usize,
    /// Tic-tac-toe symbol of the human. X moves first.
    pub human_symbol: Symbol,
}

impl Default for GamesConfig {
    fn default() -> Self {
        let options = GameOptions::default();
        Self {
            default_difficulty: Difficulty::default(),
            max_rounds: options.max_rounds,
            human_symbol: options.human_symbol,
        }
    }
}

impl GamesConfig {
    /// Options applied to new games.
    pub fn options(&self) -> GameOptions {
        GameOptions {
            max_rounds: self.max_rounds,
            human_symbol: self.human_symbol,
        }
    }
}

/// `[wait]`, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Timeout when a wait request names none.
    pub default_timeout_secs: f64,
    /// Longest wait any request may ask for.
    pub max_timeout_secs: f64,
    /// Poll interval when a wait request names none.
    pub default_poll_interval_secs: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        let settings = WaitSettings::default();
        Self {
            default_timeout_secs: settings.default_timeout.as_secs_f64(),
            max_timeout_secs: settings.max_timeout.as_secs_f64(),
            default_poll_interval_secs: settings.default_poll_interval.as_secs_f64(),
        }
    }
}

impl WaitConfig {
    /// Converts to synchronizer settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value is not a positive number of seconds
    /// or the default timeout exceeds the maximum.
    pub fn settings(&self) -> Result<WaitSettings, ConfigError> {
        let settings = WaitSettings {
            default_timeout: seconds("wait.default_timeout_secs", self.default_timeout_secs)?,
            max_timeout: seconds("wait.max_timeout_secs", self.max_timeout_secs)?,
            default_poll_interval: seconds(
                "wait.default_poll_interval_secs",
                self.default_poll_interval_secs,
            )?,
        };
        if settings.default_timeout > settings.max_timeout {
            return Err(ConfigError::new(
                "wait.default_timeout_secs must not exceed wait.max_timeout_secs",
            ));
        }
        Ok(settings)
    }
}

/// `[agent]`, used by the `agent` subcommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the arena server.
    pub server_url: String,
    /// Game variant to play.
    pub game_type: GameType,
    /// Game to join.
    pub game_id: Option<String>,
    /// Server-side wait per request.
    pub wait_timeout_secs: f64,
    /// Poll interval the server uses while waiting.
    pub poll_interval_secs: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
            game_type: GameType::TicTacToe,
            game_id: None,
            wait_timeout_secs: 30.0,
            poll_interval_secs: 1.0,
        }
    }
}

impl AgentConfig {
    /// Wait timeout as a duration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a non-positive value.
    pub fn wait_timeout(&self) -> Result<Duration, ConfigError> {
        seconds("agent.wait_timeout_secs", self.wait_timeout_secs)
    }

    /// Poll interval as a duration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a non-positive value.
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        seconds("agent.poll_interval_secs", self.poll_interval_secs)
    }
}

/// Complete arena configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Session storage.
    pub storage: StorageConfig,
    /// New-game options.
    pub games: GamesConfig,
    /// Turn synchronizer limits.
    pub wait: WaitConfig,
    /// External agent client.
    pub agent: AgentConfig,
}

impl ArenaConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(backend = %config.storage.backend, port = config.server.port, "Config loaded");
        Ok(config)
    }

    /// Loads the given file, or `arena.toml` if it exists, or defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly named file is missing, or if
    /// the chosen file cannot be parsed.
    #[instrument]
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

fn seconds(name: &str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::new(format!(
            "{} must be a positive number of seconds, got {}",
            name, secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ConfigError::new(format!("{} is out of range: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ArenaConfig::from_toml("").unwrap();
        assert_eq!(config, ArenaConfig::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.games.max_rounds, 3);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = ArenaConfig::from_toml(
            r#"
            [storage]
            backend = "sqlite"

            [games]
            default_difficulty = "hard"
            human_symbol = "O"

            [agent]
            game_type = "rps"
            game_id = "match-1"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.sqlite_path, "strictly_arena.db");
        assert_eq!(config.games.default_difficulty, Difficulty::Hard);
        assert_eq!(config.games.options().human_symbol, Symbol::O);
        assert_eq!(config.agent.game_type, GameType::RockPaperScissors);
        assert_eq!(config.agent.game_id.as_deref(), Some("match-1"));
    }

    #[test]
    fn wait_settings_are_validated() {
        let mut wait = WaitConfig::default();
        assert_eq!(wait.settings().unwrap(), WaitSettings::default());

        wait.default_poll_interval_secs = 0.0;
        assert!(wait.settings().is_err());

        let wait = WaitConfig {
            default_timeout_secs: 600.0,
            ..WaitConfig::default()
        };
        assert!(wait.settings().is_err());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = ArenaConfig::from_toml("[storage]\nbackend = \"redis\"").unwrap_err();
        assert!(err.message.contains("Failed to parse config"));
    }
}
