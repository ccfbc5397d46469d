//! Referee configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use hostage_chess::{GameState, decode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Configuration for the referee.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct RefereeConfig {
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    log_filter: String,

    /// Encoded state new sessions start from instead of the standard position.
    #[serde(default)]
    starting_position: Option<String>,

    /// Pretty-print JSON output.
    #[serde(default = "default_pretty_json")]
    pretty_json: bool,

    /// Maximum number of concurrent sessions.
    #[serde(default = "default_max_sessions")]
    max_sessions: usize,
}

#[instrument]
fn default_log_filter() -> String {
    "info,hostage_chess=debug".to_string()
}

#[instrument]
fn default_pretty_json() -> bool {
    true
}

#[instrument]
fn default_max_sessions() -> usize {
    64
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            starting_position: None,
            pretty_json: default_pretty_json(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl RefereeConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(max_sessions = config.max_sessions, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text and validates it.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        if config.max_sessions == 0 {
            return Err(ConfigError::new("max_sessions must be at least 1".to_string()));
        }
        config.starting_state()?;
        Ok(config)
    }

    /// Decoded starting position, if one is configured.
    #[instrument(skip(self))]
    pub fn starting_state(&self) -> Result<Option<GameState>, ConfigError> {
        self.starting_position
            .as_deref()
            .map(|text| {
                decode(text)
                    .map_err(|e| ConfigError::new(format!("Invalid starting_position: {}", e)))
            })
            .transpose()
    }
}

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
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
