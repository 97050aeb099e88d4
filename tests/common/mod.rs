//! Common test utilities and helpers
//!
//! - In-memory fixtures wiring the offline subsystem together
//! - Mock HTTP backend helpers
//! - Custom assertion macros

pub mod assertions;
pub mod mock_server;

pub use mock_server::*;

use engageiq_sync::client::clock::ManualClock;
use engageiq_sync::client::karma::KarmaAggregator;
use engageiq_sync::client::local_db::MemoryStorage;
use engageiq_sync::client::offline::{OfflineManager, QueueReconciler, RemoteWriter, UnsyncedQueue};
use engageiq_sync::client::remote::{MemoryDocumentStore, MemoryErrorReporter};
use engageiq_sync::shared::{AppConfig, DocumentType, Payload};
use std::sync::Arc;

pub const QUEUE_KEY: &str = "engageiq.unsynced";
pub const START_MS: u64 = 1_760_000_000_000;

/// Every collaborator of the offline subsystem, in memory
pub struct Fixture {
    pub storage: MemoryStorage,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryDocumentStore>,
    pub reporter: Arc<MemoryErrorReporter>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            storage: MemoryStorage::new(),
            clock: Arc::new(ManualClock::new(START_MS)),
            store: Arc::new(MemoryDocumentStore::new()),
            reporter: Arc::new(MemoryErrorReporter::new()),
        }
    }

    /// A queue over this fixture's storage; opening twice simulates a restart
    pub async fn open_queue(&self) -> Arc<UnsyncedQueue> {
        Arc::new(UnsyncedQueue::open(Arc::new(self.storage.clone()), QUEUE_KEY, self.clock.clone()).await)
    }

    pub fn reconciler(&self, queue: Arc<UnsyncedQueue>) -> QueueReconciler {
        let writer =
            RemoteWriter::new(self.store.clone(), self.reporter.clone()).with_clock(self.clock.clone());
        QueueReconciler::new(queue, writer, self.reporter.clone(), self.clock.clone())
    }

    pub fn karma(&self, queue: Arc<UnsyncedQueue>) -> KarmaAggregator {
        KarmaAggregator::new(self.store.clone(), queue, self.clock.clone())
    }

    pub async fn manager(&self) -> OfflineManager {
        OfflineManager::new(
            &AppConfig::default(),
            Arc::new(self.storage.clone()),
            self.store.clone(),
            self.reporter.clone(),
            self.clock.clone(),
        )
        .await
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A post payload with a title
pub fn post(id: &str, title: &str) -> Payload {
    Payload::new(id, DocumentType::Post).with_field("title", title)
}
