//! # Queue Reconciliation
//!
//! Drives retry passes over the unsynced queue and folds the results back
//! into it.
//!
//! A full pass:
//!
//! 1. Entries whose type is not on the allow-list are purged and reported,
//!    whatever their backoff state.
//! 2. The remaining entries are filtered by the backoff strategy.
//! 3. Eligible entries are grouped by type and written in batches of at most
//!    `batch_size`; items in a batch are written individually and awaited
//!    together.
//! 4. Results are applied to the queue in one mutation: delivered and
//!    invalid entries are removed, failed ones get their attempt bumped.
//!    An entry replaced while its older copy was in flight stays queued.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use engageiq_sync::client::offline::reconciliation::QueueReconciler;
//! # async fn example(reconciler: QueueReconciler) {
//! let report = reconciler.retry_all().await;
//! println!("{} of {} delivered", report.succeeded.len(), report.attempted);
//! # }
//! ```

use crate::client::clock::Clock;
use crate::client::offline::queue::{QueueEntry, UnsyncedQueue};
use crate::client::offline::retry::BackoffStrategy;
use crate::client::offline::writer::{RemoteWriter, WriteOutcome};
use crate::client::remote::ErrorReporter;
use crate::shared::config::DEFAULT_BATCH_SIZE;
use crate::shared::DocumentType;
use futures_util::future::join_all;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

const REPORT_SOURCE: &str = "unsynced.retry";

/// Summary of one retry pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryReport {
    /// Entries handed to the writer
    pub attempted: usize,
    /// Ids delivered to the store
    pub succeeded: Vec<String>,
    /// Ids that failed and stay queued
    pub failed: Vec<String>,
    /// Ids dropped as permanently invalid
    pub purged: Vec<String>,
}

/// Result of retrying a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOneOutcome {
    NotFound,
    Delivered,
    Failed,
    Purged,
}

/// Retry driver for the unsynced queue
pub struct QueueReconciler {
    queue: Arc<UnsyncedQueue>,
    writer: RemoteWriter,
    reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn Clock>,
    backoff: BackoffStrategy,
    batch_size: usize,
}

impl QueueReconciler {
    pub fn new(
        queue: Arc<UnsyncedQueue>,
        writer: RemoteWriter,
        reporter: Arc<dyn ErrorReporter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queue,
            writer,
            reporter,
            clock,
            backoff: BackoffStrategy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Maximum entries written per batch; zero is treated as one
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn backoff(&self) -> BackoffStrategy {
        self.backoff
    }

    /// Run one retry pass over the whole queue
    pub async fn retry_all(&self) -> RetryReport {
        let snapshot = self.queue.snapshot().await;
        if snapshot.is_empty() {
            return RetryReport::default();
        }

        let now = self.clock.now_ms();
        let mut report = RetryReport::default();
        let mut settled = Vec::new();

        let mut groups: BTreeMap<DocumentType, Vec<&QueueEntry>> = BTreeMap::new();
        for entry in &snapshot {
            match entry.kind().document_type() {
                Some(doc_type) => {
                    if self.backoff.is_ready(entry, now) {
                        groups.entry(doc_type).or_default().push(entry);
                    }
                }
                None => {
                    self.report_unknown_type(entry).await;
                    report.purged.push(entry.id().to_string());
                    settled.push(entry.payload.clone());
                }
            }
        }

        if groups.is_empty() && report.purged.is_empty() {
            tracing::debug!(
                "[Reconciler] {} unsynced items, none ready for retry",
                snapshot.len()
            );
            return report;
        }

        for (doc_type, entries) in &groups {
            for batch in entries.chunks(self.batch_size) {
                tracing::debug!("[Reconciler] Writing batch of {} {} items", batch.len(), doc_type);
                let outcomes = join_all(batch.iter().map(|e| self.writer.write(&e.payload))).await;
                report.attempted += batch.len();

                for (entry, outcome) in batch.iter().zip(outcomes) {
                    let id = entry.id().to_string();
                    match outcome {
                        WriteOutcome::Delivered => {
                            report.succeeded.push(id);
                            settled.push(entry.payload.clone());
                        }
                        WriteOutcome::Failed(_) => report.failed.push(id),
                        WriteOutcome::Invalid(_) => {
                            report.purged.push(id);
                            settled.push(entry.payload.clone());
                        }
                    }
                }
            }
        }

        let failed: HashSet<String> = report.failed.iter().cloned().collect();
        self.queue.record_results(&settled, &failed, now).await;

        tracing::info!(
            "[Reconciler] Retry pass: {} attempted, {} delivered, {} failed, {} purged",
            report.attempted,
            report.succeeded.len(),
            report.failed.len(),
            report.purged.len()
        );
        report
    }

    /// Retry one entry now, ignoring its backoff
    pub async fn retry_one(&self, id: &str) -> RetryOneOutcome {
        let Some(entry) = self.queue.get(id).await else {
            return RetryOneOutcome::NotFound;
        };

        let settled = std::slice::from_ref(&entry.payload);
        let now = self.clock.now_ms();

        if entry.kind().document_type().is_none() {
            self.report_unknown_type(&entry).await;
            self.queue.record_results(settled, &HashSet::new(), now).await;
            return RetryOneOutcome::Purged;
        }

        match self.writer.write(&entry.payload).await {
            WriteOutcome::Delivered => {
                self.queue.record_results(settled, &HashSet::new(), now).await;
                tracing::info!("[Reconciler] Delivered {} on manual retry", id);
                RetryOneOutcome::Delivered
            }
            WriteOutcome::Failed(reason) => {
                let failed = HashSet::from([id.to_string()]);
                self.queue.record_results(&[], &failed, now).await;
                tracing::warn!("[Reconciler] Manual retry of {} failed: {}", id, reason);
                RetryOneOutcome::Failed
            }
            WriteOutcome::Invalid(_) => {
                self.queue.record_results(settled, &HashSet::new(), now).await;
                RetryOneOutcome::Purged
            }
        }
    }

    async fn report_unknown_type(&self, entry: &QueueEntry) {
        tracing::warn!(
            "[Reconciler] Purging {} with unrecognized type {:?}",
            entry.id(),
            entry.kind().as_str()
        );
        self.reporter
            .log_error(
                REPORT_SOURCE,
                &format!("unrecognized payload type {:?}", entry.kind().as_str()),
                json!({ "id": entry.id(), "type": entry.kind().as_str(), "attempts": entry.attempts }),
            )
            .await;
    }
}
