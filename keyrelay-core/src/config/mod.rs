//! Configuration management for keyrelay
//!
//! Defaults, TOML file loading and `KEYRELAY_*` environment overrides.

use humantime_serde::re::humantime::parse_duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Semaphore;

mod error;

pub use error::ConfigError;

/// Main relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dispatch configuration
    pub dispatch: DispatchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Upper bound on relay tasks doing work at the same time
    pub max_concurrent_tasks: usize,

    /// How long one transport send may take before it counts as failed
    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,

    /// Log file path (optional)
    pub log_file: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 16,
            send_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: KEYRELAY_<SECTION>_<KEY>
    /// Example: KEYRELAY_DISPATCH_SEND_TIMEOUT=10s
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, then apply environment overrides
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let mut config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(tasks) = env::var("KEYRELAY_DISPATCH_MAX_CONCURRENT_TASKS") {
            self.dispatch.max_concurrent_tasks =
                tasks.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnv {
                    var: "KEYRELAY_DISPATCH_MAX_CONCURRENT_TASKS",
                    reason: e.to_string(),
                })?;
        }
        if let Ok(timeout) = env::var("KEYRELAY_DISPATCH_SEND_TIMEOUT") {
            self.dispatch.send_timeout = parse_duration(&timeout).map_err(|e| ConfigError::InvalidEnv {
                var: "KEYRELAY_DISPATCH_SEND_TIMEOUT",
                reason: e.to_string(),
            })?;
        }

        if let Ok(level) = env::var("KEYRELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = env::var("KEYRELAY_LOG_JSON") {
            self.logging.json_format =
                json.parse().map_err(|e: std::str::ParseBoolError| ConfigError::InvalidEnv {
                    var: "KEYRELAY_LOG_JSON",
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.max_concurrent_tasks == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_concurrent_tasks must be greater than 0".to_string(),
            ));
        }

        if self.dispatch.max_concurrent_tasks > Semaphore::MAX_PERMITS {
            return Err(ConfigError::ValidationFailed(format!(
                "max_concurrent_tasks must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }

        if self.dispatch.send_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "send_timeout must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}
