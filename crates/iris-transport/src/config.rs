//! Configuration types for Iris
//!
//! Loaded from TOML; every field has a default, so an empty file is valid.
//!
//! ```toml
//! [engine]
//! strategy = "threaded"     # or "sequential"
//! max_datagram_size = 1500
//! poll_timeout_ms = 5
//! idle_backoff_ms = 1
//! stop_timeout_ms = 5000
//!
//! [translator]
//! idle_backoff_ms = 1
//! stop_timeout_ms = 5000
//! ```

use crate::engine::StrategyKind;
use crate::{
    DEFAULT_IDLE_BACKOFF_MS, DEFAULT_POLL_TIMEOUT_MS, DEFAULT_STOP_TIMEOUT_MS, MAX_DATAGRAM_SIZE,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IrisConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// Translator settings
    pub translator: TranslatorConfig,
}

impl IrisConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine or translator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.translator.validate()
    }
}

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Concurrency strategy
    pub strategy: StrategyKind,
    /// Largest datagram read or written, in bytes
    pub max_datagram_size: usize,
    /// Upper bound on a single receive poll
    pub poll_timeout_ms: u64,
    /// Pause taken by an idle send worker
    pub idle_backoff_ms: u64,
    /// Upper bound on `stop()`
    pub stop_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            max_datagram_size: MAX_DATAGRAM_SIZE,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            idle_backoff_ms: DEFAULT_IDLE_BACKOFF_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Receive poll bound.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Idle pause.
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// Stop bound.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_datagram_size == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_datagram_size must be positive".to_string(),
            ));
        }
        if self.poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "engine.poll_timeout_ms must be positive".to_string(),
            ));
        }
        if self.stop_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "engine.stop_timeout_ms must be positive".to_string(),
            ));
        }
        // A blocked receive must be able to return before stop gives up.
        if self.stop_timeout_ms <= self.poll_timeout_ms {
            return Err(ConfigError::Invalid(format!(
                "engine.stop_timeout_ms ({}) must exceed engine.poll_timeout_ms ({})",
                self.stop_timeout_ms, self.poll_timeout_ms
            )));
        }
        Ok(())
    }
}

/// Translator settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    /// Pause after a pass that moved nothing
    pub idle_backoff_ms: u64,
    /// Upper bound on `stop()`
    pub stop_timeout_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            idle_backoff_ms: DEFAULT_IDLE_BACKOFF_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
        }
    }
}

impl TranslatorConfig {
    /// Idle pause.
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    /// Stop bound.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.stop_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "translator.stop_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read {path}: {error}")]
    Io {
        /// Path that failed
        path: String,
        /// I/O error message
        error: String,
    },
    /// TOML parsing error.
    #[error("Failed to parse config: {0}")]
    Parse(String),
    /// Parsed but unusable value.
    #[error("Invalid config: {0}")]
    Invalid(String),
}
