//! Idempotent Remote Writer
//!
//! Every delivery is an upsert keyed by the payload id, so replaying a write
//! that already landed overwrites the document instead of duplicating it.
//! The writer never returns an error: store failures become
//! [`WriteOutcome::Failed`] for the caller to retry, and malformed payloads
//! become [`WriteOutcome::Invalid`] after being reported.
//!
//! Queued karma awards are not upserted as-is: they are settled against the
//! stored progress record (see [`crate::client::karma::ledger`]).

use crate::client::clock::{Clock, SystemClock};
use crate::client::karma::ledger::{self, PendingAward, Settlement};
use crate::client::remote::{DocumentStore, ErrorReporter};
use crate::shared::{Payload, SyncError};
use serde_json::json;
use std::sync::Arc;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The store acknowledged the document
    Delivered,
    /// Transient failure; the payload stays queued
    Failed(String),
    /// The payload can never be delivered
    Invalid(String),
}

impl WriteOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, WriteOutcome::Delivered)
    }
}

/// Writes payloads to the remote store
#[derive(Clone)]
pub struct RemoteWriter {
    store: Arc<dyn DocumentStore>,
    reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn Clock>,
}

impl RemoteWriter {
    pub fn new(store: Arc<dyn DocumentStore>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            store,
            reporter,
            clock: Arc::new(SystemClock),
        }
    }

    /// Clock stamping settled awards
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The store this writer delivers to
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Deliver one payload
    pub async fn write(&self, payload: &Payload) -> WriteOutcome {
        if let Some(award) = PendingAward::from_payload(payload) {
            return match award {
                Ok(award) => self.settle(&award).await,
                Err(e) => self.reject(payload, e).await,
            };
        }

        let document = match payload.normalize() {
            Ok(document) => document,
            Err(e) => return self.reject(payload, e).await,
        };

        match self.store.create(document).await {
            Ok(stored) if stored.id == payload.id => {
                tracing::debug!("[Writer] Delivered {} {}", payload.kind, payload.id);
                WriteOutcome::Delivered
            }
            Ok(stored) => {
                tracing::warn!(
                    "[Writer] Store acknowledged {} with id {}; treating as failed",
                    payload.id,
                    stored.id
                );
                WriteOutcome::Failed(format!("store returned id {}", stored.id))
            }
            Err(e) => {
                tracing::warn!("[Writer] Failed to deliver {} {}: {}", payload.kind, payload.id, e);
                WriteOutcome::Failed(e.to_string())
            }
        }
    }

    async fn settle(&self, award: &PendingAward) -> WriteOutcome {
        match ledger::settle(self.store.as_ref(), award, self.clock.now_ms()).await {
            Ok(Settlement::Applied) => {
                tracing::info!("[Writer] Settled queued award {}", award.key());
                WriteOutcome::Delivered
            }
            Ok(Settlement::AlreadyApplied) => {
                tracing::debug!("[Writer] Award {} was already settled", award.key());
                WriteOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!("[Writer] Failed to settle award {}: {}", award.key(), e);
                WriteOutcome::Failed(e.to_string())
            }
        }
    }

    async fn reject(&self, payload: &Payload, error: SyncError) -> WriteOutcome {
        tracing::warn!("[Writer] Invalid payload {:?}: {}", payload.id, error);
        self.reporter
            .log_error(
                "unsynced.write",
                &error.to_string(),
                json!({ "id": payload.id, "type": payload.kind.as_str() }),
            )
            .await;
        WriteOutcome::Invalid(error.to_string())
    }
}
