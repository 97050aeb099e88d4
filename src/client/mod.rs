//! # Client Runtime
//!
//! The offline-first half of EngageIQ: everything that runs next to the UI.
//!
//! ## Architecture
//!
//! - **local_db**: durable key-value storage backing the unsynced queue
//! - **remote**: remote document store clients and the error sink
//! - **offline**: the unsynced queue, backoff, idempotent writer,
//!   reconciler and notification bus, wired together by `OfflineManager`
//! - **karma**: daily progress counters and idempotent karma awards
//! - **clock**: time source, swappable in tests
//! - **config**: environment-aware client configuration

pub mod clock;
pub mod config;
pub mod karma;
pub mod local_db;
pub mod offline;
pub mod remote;
