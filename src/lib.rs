//! EngageIQ Sync - Main Library
//!
//! Offline write subsystem for the EngageIQ social-engagement client. Writes
//! that fail to reach the remote document store are kept in a durable local
//! queue and retried with exponential backoff; karma and daily progress
//! counters are applied exactly once per logical event using deterministic
//! audit keys.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by every part of the client
//!   - Documents and payloads, daily progress and audit records
//!   - Error types
//!   - Application configuration
//!
//! - **`client`** - The offline-first client runtime
//!   - `offline`: unsynced queue, backoff, idempotent writer, reconciler,
//!     notification bus and the `OfflineManager` facade
//!   - `karma`: daily progress / karma aggregation
//!   - `local_db`: durable key-value storage for the queue
//!   - `remote`: remote document store clients and error reporting
//!
//! # Usage
//!
//! ```rust,no_run
//! use engageiq_sync::client::config::Config;
//! use engageiq_sync::client::offline::OfflineManager;
//! use engageiq_sync::shared::{DocumentType, Payload};
//!
//! # async fn example() -> Result<(), engageiq_sync::shared::SyncError> {
//! let manager = OfflineManager::from_config(&Config::new()).await?;
//!
//! let post = Payload::new("p1", DocumentType::Post).with_field("title", "hi");
//! manager.submit(post).await;
//!
//! // Later, when connectivity returns
//! let report = manager.retry_all().await;
//! println!("{} attempted, {} synced", report.attempted, report.succeeded.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Storage and store clients return `Result<T, SyncError>`. The queue,
//! reconciler and aggregator never surface expected failures as errors:
//! they return structured outcomes and log through `tracing`.

/// Shared types and data structures
pub mod shared;

/// Offline-first client runtime
pub mod client;
