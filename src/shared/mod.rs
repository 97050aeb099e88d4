//! Shared Module
//!
//! Types used across the client runtime: the documents written to the
//! remote store, the daily progress and award audit records, the error
//! type and the application configuration.
//!
//! All document types serialize to the camelCase JSON shape the EngageIQ
//! REST backend stores.

/// Documents, payloads and document types
pub mod document;

/// Daily progress and award audit records
pub mod progress;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use document::{DocumentType, Payload, PayloadKind, RemoteDocument};
pub use error::SyncError;
pub use progress::{award_key, AwardAuditRecord, DailyProgressRecord, KarmaTraceRecord, ProgressCounter};
