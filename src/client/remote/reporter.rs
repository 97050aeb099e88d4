//! Error Reporting Sink
//!
//! Diagnostics for dropped or invalid writes are sent to an [`ErrorReporter`].
//! Reporting is a side channel: it never fails the operation that triggered
//! it, and a reporter that cannot deliver its own report only logs.

use crate::client::clock::{Clock, SystemClock};
use crate::client::remote::DocumentStore;
use crate::shared::{DocumentType, Payload};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Best-effort diagnostic sink
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    /// Record an error; must not fail or panic
    async fn log_error(&self, source: &str, error: &str, context: Value);
}

/// Reporter that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

#[async_trait]
impl ErrorReporter for TracingErrorReporter {
    async fn log_error(&self, source: &str, error: &str, context: Value) {
        tracing::error!(source, context = %context, "{}", error);
    }
}

/// Reporter that writes `error` documents to the remote store
pub struct StoreErrorReporter {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl StoreErrorReporter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait]
impl ErrorReporter for StoreErrorReporter {
    async fn log_error(&self, source: &str, error: &str, context: Value) {
        let payload = Payload::new(format!("error-{}", uuid::Uuid::new_v4()), DocumentType::Error)
            .with_field("source", source)
            .with_field("message", error)
            .with_field("context", context)
            .with_field("createdAt", self.clock.now_ms());

        let document = match payload.normalize() {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("[Reporter] Could not build error document: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.create(document).await {
            tracing::warn!("[Reporter] Failed to record error from {}: {}", source, e);
        }
    }
}

/// One captured report
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub source: String,
    pub error: String,
    pub context: Value,
}

/// Reporter that keeps reports in memory, for tests and the CLI summary
#[derive(Debug, Default)]
pub struct MemoryErrorReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl MemoryErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports captured so far
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ErrorReporter for MemoryErrorReporter {
    async fn log_error(&self, source: &str, error: &str, context: Value) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(ErrorReport {
                source: source.to_string(),
                error: error.to_string(),
                context,
            });
        }
    }
}
