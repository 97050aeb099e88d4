//! # Offline Write System
//!
//! Keeps writes that could not reach the remote store and delivers them
//! once connectivity returns.
//!
//! ## Architecture
//!
//! - **Unsynced queue**: durable list of pending writes, one per id
//! - **Backoff**: decides which entries may be retried now
//! - **Writer**: idempotent upsert of one payload
//! - **Reconciler**: batched retry passes folded back into the queue
//! - **Notification bus**: pushes queue snapshots to UI listeners
//!
//! ## Key Components
//!
//! - `queue.rs`: persistent queue
//! - `retry.rs`: backoff strategies
//! - `writer.rs`: remote writer
//! - `reconciliation.rs`: retry passes
//! - `notify.rs`: listener registry
//!
//! ## Usage
//!
//! ```rust,no_run
//! use engageiq_sync::client::config::Config;
//! use engageiq_sync::client::offline::{OfflineManager, SubmitOutcome};
//! use engageiq_sync::shared::{DocumentType, Payload};
//!
//! # async fn example() -> Result<(), engageiq_sync::shared::SyncError> {
//! let manager = OfflineManager::from_config(&Config::new()).await?;
//!
//! let post = Payload::new("p1", DocumentType::Post).with_field("title", "hi");
//! if manager.submit(post).await == SubmitOutcome::Queued {
//!     println!("{} unsynced", manager.pending_count().await);
//! }
//! # Ok(())
//! # }
//! ```

pub mod notify;
pub mod queue;
pub mod reconciliation;
pub mod retry;
pub mod writer;

// Re-export main types
pub use notify::{NotificationBus, QueueListener, Subscription};
pub use queue::{QueueEntry, UnsyncedQueue};
pub use reconciliation::{QueueReconciler, RetryOneOutcome, RetryReport};
pub use retry::BackoffStrategy;
pub use writer::{RemoteWriter, WriteOutcome};

use crate::client::clock::{Clock, SystemClock};
use crate::client::config::Config;
use crate::client::karma::{FollowAwardCache, KarmaAggregator};
use crate::client::local_db::{LocalStorage, SqliteStorage};
use crate::client::remote::{DocumentStore, ErrorReporter, HttpDocumentStore, StoreErrorReporter};
use crate::shared::{AppConfig, Payload, SyncError};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of submitting a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Written to the remote store
    Delivered,
    /// Store unreachable; kept in the unsynced queue
    Queued,
    /// Malformed payload; dropped and reported
    Rejected,
}

/// Queue statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Entries waiting for delivery
    pub pending: usize,
    /// Entries with at least one failed attempt
    pub retrying: usize,
    /// Entries never attempted by a retry pass
    pub never_attempted: usize,
    /// Entries the backoff would allow to retry now
    pub ready_now: usize,
}

/// Main offline manager coordinating the queue, writer and reconciler
pub struct OfflineManager {
    queue: Arc<UnsyncedQueue>,
    writer: RemoteWriter,
    reconciler: QueueReconciler,
    karma: KarmaAggregator,
    clock: Arc<dyn Clock>,
}

impl OfflineManager {
    /// Wire the subsystem from its collaborators
    pub async fn new(
        app: &AppConfig,
        storage: Arc<dyn LocalStorage>,
        store: Arc<dyn DocumentStore>,
        reporter: Arc<dyn ErrorReporter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let queue = Arc::new(UnsyncedQueue::open(storage, app.storage_key.clone(), clock.clone()).await);
        let writer = RemoteWriter::new(store.clone(), reporter.clone()).with_clock(clock.clone());
        let reconciler = QueueReconciler::new(queue.clone(), writer.clone(), reporter, clock.clone())
            .with_backoff(BackoffStrategy::from_config(app))
            .with_batch_size(app.batch_size);
        let karma = KarmaAggregator::new(store, queue.clone(), clock.clone())
            .with_follow_cache(Arc::new(FollowAwardCache::new()));

        Self {
            queue,
            writer,
            reconciler,
            karma,
            clock,
        }
    }

    /// SQLite-backed queue and HTTP store from client configuration
    pub async fn from_config(config: &Config) -> Result<Self, SyncError> {
        let path = match config.data_dir() {
            Some(dir) => dir.join(SqliteStorage::FILE_NAME),
            None => SqliteStorage::default_path(),
        };
        let storage = SqliteStorage::open(&path).await?;
        let store: Arc<dyn DocumentStore> = Arc::new(HttpDocumentStore::new(config)?);
        let reporter = Arc::new(StoreErrorReporter::new(store.clone()));
        tracing::info!(
            "[Queue] Using {} for unsynced writes to {}",
            path.display(),
            config.server_url()
        );

        Ok(Self::new(
            config.app(),
            Arc::new(storage),
            store,
            reporter,
            Arc::new(SystemClock),
        )
        .await)
    }

    /// Write a payload now, queueing it if the store is unreachable
    pub async fn submit(&self, payload: Payload) -> SubmitOutcome {
        match self.writer.write(&payload).await {
            WriteOutcome::Delivered => SubmitOutcome::Delivered,
            WriteOutcome::Failed(_) => {
                // a newer write of a queued id supersedes the queued copy
                self.queue.replace(payload).await;
                SubmitOutcome::Queued
            }
            WriteOutcome::Invalid(_) => SubmitOutcome::Rejected,
        }
    }

    pub async fn retry_all(&self) -> RetryReport {
        self.reconciler.retry_all().await
    }

    pub async fn retry_one(&self, id: &str) -> RetryOneOutcome {
        self.reconciler.retry_one(id).await
    }

    /// Drop one unsynced write without delivering it
    pub async fn discard(&self, id: &str) -> bool {
        let removed = self.queue.remove(id).await;
        if removed {
            tracing::info!("[Queue] Discarded unsynced item {}", id);
        }
        removed
    }

    /// Drop every unsynced write
    pub async fn discard_all(&self) -> usize {
        self.queue.clear().await
    }

    pub async fn pending_count(&self) -> usize {
        self.queue.len().await
    }

    pub async fn pending_ids(&self) -> HashSet<String> {
        self.queue.list_ids().await
    }

    /// Follow queue changes; the listener is called immediately
    pub async fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[QueueEntry]) + Send + Sync + 'static,
    {
        self.queue.subscribe(listener).await
    }

    /// Get queue statistics
    pub async fn stats(&self) -> QueueStats {
        let snapshot = self.queue.snapshot().await;
        let now = self.clock.now_ms();
        let backoff = self.reconciler.backoff();
        let retrying = snapshot.iter().filter(|e| e.attempts > 0).count();

        QueueStats {
            pending: snapshot.len(),
            retrying,
            never_attempted: snapshot.len() - retrying,
            ready_now: backoff.ready(&snapshot, now).len(),
        }
    }

    pub fn queue(&self) -> &Arc<UnsyncedQueue> {
        &self.queue
    }

    /// Karma aggregator sharing this manager's queue and store
    pub fn karma(&self) -> &KarmaAggregator {
        &self.karma
    }
}
