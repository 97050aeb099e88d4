//! Application configuration module
//!
//! Provides the configuration shared by the offline queue, the reconciler and
//! the remote store client. Values come from code (`AppConfigBuilder`) or a
//! TOML file where every key is optional:
//!
//! ```toml
//! server_url = "https://api.engageiq.example"
//! storage_key = "engageiq.unsynced"
//! batch_size = 100
//! backoff_base_ms = 1000
//! backoff_max_ms = 300000
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default key the unsynced queue is stored under
pub const DEFAULT_STORAGE_KEY: &str = "engageiq.unsynced";
/// Default number of queued items sent per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Default first retry delay
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
/// Default ceiling on the retry delay (5 minutes)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 300_000;
/// Default remote request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote store base URL
    pub server_url: Option<String>,
    /// Storage key for the unsynced queue
    pub storage_key: String,
    /// Directory holding the local SQLite database
    pub data_dir: Option<PathBuf>,
    /// Maximum items per delivery batch
    pub batch_size: usize,
    /// First retry delay in milliseconds
    pub backoff_base_ms: u64,
    /// Retry delay ceiling in milliseconds
    pub backoff_max_ms: u64,
    /// Remote request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: None,
            batch_size: DEFAULT_BATCH_SIZE,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document, then validate it
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("storage_key"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.backoff_base_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backoff_base_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.backoff_max_ms < self.backoff_base_ms {
            return Err(ConfigError::InvalidValue {
                field: "backoff_max_ms",
                reason: format!("must be at least backoff_base_ms ({})", self.backoff_base_ms),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = Some(url.into());
        self
    }

    /// Set the queue storage key
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    /// Set the local data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    /// Set the delivery batch size
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the backoff base and ceiling
    pub fn backoff(mut self, base_ms: u64, max_ms: u64) -> Self {
        self.config.backoff_base_ms = base_ms;
        self.config.backoff_max_ms = max_ms;
        self
    }

    /// Set the remote request timeout
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read config: {0}")]
    Io(String),
}
