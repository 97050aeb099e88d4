//! Shared Error Types
//!
//! This module defines the error type returned by the storage and remote
//! store layers. The queue, reconciler and karma aggregator catch these and
//! turn them into structured outcomes, so callers of those components never
//! see a `SyncError` for an expected failure.
//!
//! # Error Categories
//!
//! - `Serialization` - JSON/TOML encoding or decoding failures
//! - `Validation` - A payload or config field failed validation
//! - `Storage` - The durable local store could not be read or written
//! - `Remote` - The remote document store rejected or failed a request
//! - `Config` - Configuration could not be loaded
//!
//! # Usage
//!
//! ```rust
//! use engageiq_sync::shared::error::SyncError;
//!
//! let error = SyncError::validation("id", "payload id cannot be empty");
//! assert!(!error.is_transient());
//! ```
use thiserror::Error;

/// Errors raised by storage, remote store and configuration layers
#[derive(Debug, Error, Clone)]
pub enum SyncError {
    /// JSON or TOML serialization or deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Local durable storage error
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message
        message: String,
    },

    /// Remote document store error
    #[error("Remote store error: {message}")]
    Remote {
        /// HTTP status, when the failure came from a response
        status: Option<u16>,
        /// Human-readable error message
        message: String,
    },

    /// Configuration loading error
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message
        message: String,
    },
}

impl SyncError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new remote error without a status code
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            message: message.into(),
        }
    }

    /// Create a new remote error carrying an HTTP status
    pub fn remote_status(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a new config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether retrying the same request later may succeed.
    ///
    /// Remote failures are transient unless the store answered with a 4xx
    /// status other than 408/429.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Remote { status: Some(s), .. } => !(400..500).contains(s) || *s == 408 || *s == 429,
            Self::Remote { status: None, .. } | Self::Storage { .. } => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML error: {}", err))
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage(format!("SQLite error: {}", err))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::remote_status(status.as_u16(), err.to_string()),
            None => Self::remote(format!("Network error: {}", err)),
        }
    }
}
