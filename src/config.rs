//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Configuration for the match server.
///
/// Resolved from, lowest precedence first: built-in defaults, a TOML
/// file, environment variables, command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database path. In-memory storage when absent.
    #[serde(default)]
    database_path: Option<String>,

    /// Delay before the automated opponent answers, in milliseconds.
    #[serde(default = "default_automated_delay_ms")]
    automated_delay_ms: u64,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    5000
}

#[instrument]
fn default_automated_delay_ms() -> u64 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: None,
            automated_delay_ms: default_automated_delay_ms(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if given, defaults otherwise, then applies environment
    /// overrides.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `PORT`, `HOST`, `DATABASE_PATH` and `AI_DELAY_MS` from
    /// `lookup`.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = Some(path);
        }
        if let Some(delay) = lookup("AI_DELAY_MS") {
            self.automated_delay_ms = delay
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid AI_DELAY_MS '{}': {}", delay, e)))?;
        }
        Ok(self)
    }

    /// Delay before the automated opponent answers.
    pub fn automated_delay(&self) -> Duration {
        Duration::from_millis(self.automated_delay_ms)
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("port = 8080\n").unwrap();
        assert_eq!(*config.port(), 8080);
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.automated_delay_ms(), 500);
        assert_eq!(*config.database_path(), None);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let env: HashMap<&str, &str> = [("PORT", "9000"), ("DATABASE_PATH", "matches.db")].into();
        let config = ServerConfig::default()
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(*config.port(), 9000);
        assert_eq!(config.database_path().as_deref(), Some("matches.db"));
    }

    #[test]
    fn test_invalid_env_port_is_rejected() {
        let result = ServerConfig::default()
            .with_env_overrides(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_setters_override() {
        let config = ServerConfig::default()
            .with_port(7000)
            .with_automated_delay_ms(0);
        assert_eq!(*config.port(), 7000);
        assert_eq!(config.automated_delay(), Duration::ZERO);
    }

    #[test]
    fn test_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "host = \"0.0.0.0\"\nautomated_delay_ms = 10\n").unwrap();
        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.automated_delay(), Duration::from_millis(10));
    }
}
