//! # Unsynced Queue
//!
//! Durable list of writes that have not reached the remote store yet.
//! The whole queue is persisted as one JSON array under a single storage
//! key after every mutation, before listeners are notified, so a restart
//! resumes from the last known state.
//!
//! ## Invariants
//!
//! - At most one entry per payload id; a second `add` with the same id is a
//!   no-op.
//! - Reads never fail: a missing key is an empty queue, and unreadable or
//!   malformed content is logged and treated as empty.
//! - Listeners see snapshots in mutation order: they run before the write
//!   lock is released.
//! - A delivery result only removes an entry whose payload is still the one
//!   that was delivered; content swapped in by `replace` meanwhile stays.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use engageiq_sync::client::clock::SystemClock;
//! use engageiq_sync::client::local_db::MemoryStorage;
//! use engageiq_sync::client::offline::queue::UnsyncedQueue;
//! use engageiq_sync::shared::{DocumentType, Payload};
//!
//! # async fn example() {
//! let queue = UnsyncedQueue::open(Arc::new(MemoryStorage::new()), "engageiq.unsynced", Arc::new(SystemClock)).await;
//!
//! let _badge = queue.subscribe(|entries| println!("{} unsynced", entries.len())).await;
//! queue.add(Payload::new("p1", DocumentType::Post).with_field("title", "hi")).await;
//! assert!(queue.list_ids().await.contains("p1"));
//! # }
//! ```

use crate::client::clock::Clock;
use crate::client::local_db::LocalStorage;
use crate::client::offline::notify::{NotificationBus, Subscription};
use crate::shared::{Payload, PayloadKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A pending write and its delivery history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// The document to deliver
    pub payload: Payload,
    /// Delivery attempts made so far
    #[serde(default)]
    pub attempts: u32,
    /// Time of the most recent attempt (ms since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt: Option<u64>,
    /// Time the entry was queued (ms since epoch)
    #[serde(default)]
    pub added_at: u64,
}

impl QueueEntry {
    pub fn id(&self) -> &str {
        &self.payload.id
    }

    pub fn kind(&self) -> &PayloadKind {
        &self.payload.kind
    }
}

/// Persistent queue of unsynced writes
pub struct UnsyncedQueue {
    storage: Arc<dyn LocalStorage>,
    key: String,
    clock: Arc<dyn Clock>,
    entries: RwLock<Vec<QueueEntry>>,
    bus: NotificationBus,
}

impl fmt::Debug for UnsyncedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsyncedQueue")
            .field("key", &self.key)
            .field("bus", &self.bus)
            .finish()
    }
}

impl UnsyncedQueue {
    /// Open the queue stored under `key`
    pub async fn open(
        storage: Arc<dyn LocalStorage>,
        key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let key = key.into();
        let entries = load(storage.as_ref(), &key).await;
        if !entries.is_empty() {
            tracing::info!("[Queue] Restored {} unsynced items from {}", entries.len(), key);
        }

        Self {
            storage,
            key,
            clock,
            entries: RwLock::new(entries),
            bus: NotificationBus::new(),
        }
    }

    /// Queue a payload. Returns false if it has no id or is already queued.
    pub async fn add(&self, payload: Payload) -> bool {
        if !payload.has_id() {
            tracing::warn!("[Queue] Refusing to queue {} payload without id", payload.kind);
            return false;
        }

        let now = self.clock.now_ms();
        self.mutate(|entries| {
            if entries.iter().any(|e| e.payload.id == payload.id) {
                tracing::debug!("[Queue] {} already queued; skipping", payload.id);
                return (false, false);
            }
            tracing::debug!("[Queue] Queued {} {}", payload.kind, payload.id);
            entries.push(QueueEntry {
                payload,
                attempts: 0,
                last_attempt: None,
                added_at: now,
            });
            (true, true)
        })
        .await
    }

    /// Queue a raw JSON document
    pub async fn add_value(&self, value: Value) -> bool {
        match Payload::from_value(value) {
            Ok(payload) => self.add(payload).await,
            Err(e) => {
                tracing::warn!("[Queue] Refusing to queue malformed payload: {}", e);
                false
            }
        }
    }

    /// Queue a payload, or swap in the new content if its id is already
    /// queued. The existing entry keeps its attempt history.
    pub async fn replace(&self, payload: Payload) -> bool {
        if !payload.has_id() {
            tracing::warn!("[Queue] Refusing to queue {} payload without id", payload.kind);
            return false;
        }

        let now = self.clock.now_ms();
        self.mutate(|entries| {
            match entries.iter_mut().find(|e| e.payload.id == payload.id) {
                Some(entry) => entry.payload = payload,
                None => entries.push(QueueEntry {
                    payload,
                    attempts: 0,
                    last_attempt: None,
                    added_at: now,
                }),
            }
            (true, true)
        })
        .await
    }

    /// Remove one entry
    pub async fn remove(&self, id: &str) -> bool {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| e.payload.id != id);
            let removed = entries.len() != before;
            (removed, removed)
        })
        .await
    }

    /// Remove several entries in one mutation
    pub async fn remove_many(&self, ids: &HashSet<String>) -> usize {
        if ids.is_empty() {
            return 0;
        }
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| !ids.contains(&e.payload.id));
            let removed = before - entries.len();
            (removed, removed > 0)
        })
        .await
    }

    /// Discard every entry; returns how many were dropped
    pub async fn clear(&self) -> usize {
        let discarded = self
            .mutate(|entries| {
                let count = entries.len();
                entries.clear();
                (count, true)
            })
            .await;
        tracing::info!("[Queue] Cleared {} unsynced items", discarded);
        discarded
    }

    /// Apply the outcome of a delivery pass in one mutation.
    ///
    /// `settled` holds the payloads that were delivered or dropped; each is
    /// removed only if the queued payload under its id is still identical.
    /// `failed` ids get one more attempt stamped at `now`.
    pub async fn record_results(
        &self,
        settled: &[Payload],
        failed: &HashSet<String>,
        now: u64,
    ) -> (usize, usize) {
        if settled.is_empty() && failed.is_empty() {
            return (0, 0);
        }
        let settled: HashMap<&str, &Payload> = settled.iter().map(|p| (p.id.as_str(), p)).collect();

        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| match settled.get(e.id()) {
                Some(delivered) if **delivered == e.payload => false,
                Some(_) => {
                    tracing::debug!("[Queue] {} changed during delivery; keeping newer copy", e.id());
                    true
                }
                None => true,
            });
            let removed = before - entries.len();

            let mut bumped = 0;
            for entry in entries.iter_mut().filter(|e| failed.contains(&e.payload.id)) {
                entry.attempts = entry.attempts.saturating_add(1);
                entry.last_attempt = Some(now);
                bumped += 1;
            }
            ((removed, bumped), removed + bumped > 0)
        })
        .await
    }

    /// Register a listener; it is called now and after every mutation
    pub async fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[QueueEntry]) + Send + Sync + 'static,
    {
        // registering under the read lock keeps the first snapshot in order
        let entries = self.entries.read().await;
        self.bus.subscribe_with_snapshot(Arc::new(listener), &entries)
    }

    /// Ids of every queued payload
    pub async fn list_ids(&self) -> HashSet<String> {
        let entries = self.entries.read().await;
        entries.iter().map(|e| e.payload.id.clone()).collect()
    }

    /// Copy of the current entries, in queue order
    pub async fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<QueueEntry> {
        let entries = self.entries.read().await;
        entries.iter().find(|e| e.payload.id == id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.iter().any(|e| e.payload.id == id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Storage key the queue persists under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run `f` under the write lock. When it reports a change the new state
    /// is persisted and listeners are notified before the lock is released.
    async fn mutate<R>(&self, f: impl FnOnce(&mut Vec<QueueEntry>) -> (R, bool)) -> R {
        let mut entries = self.entries.write().await;
        let (result, changed) = f(&mut entries);
        if changed {
            self.persist(&entries).await;
            self.bus.notify(&entries);
        }
        result
    }

    async fn persist(&self, entries: &[QueueEntry]) {
        let raw = match serde_json::to_string(entries) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("[Queue] Failed to serialize queue: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &raw).await {
            tracing::error!("[Queue] Failed to persist queue to {}: {}", self.key, e);
        }
    }
}

/// Read the persisted queue, tolerating missing and malformed content
async fn load(storage: &dyn LocalStorage, key: &str) -> Vec<QueueEntry> {
    let raw = match storage.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::error!("[Queue] Failed to read {}: {}; starting empty", key, e);
            return Vec::new();
        }
    };

    let items: Vec<Value> = match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("[Queue] Stored queue under {} is corrupt: {}; starting empty", key, e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<QueueEntry>(item) {
            Ok(entry) if entry.payload.has_id() && seen.insert(entry.payload.id.clone()) => {
                entries.push(entry)
            }
            Ok(entry) => {
                tracing::warn!("[Queue] Dropping stored entry with empty or duplicate id {:?}", entry.payload.id)
            }
            Err(e) => tracing::warn!("[Queue] Dropping malformed stored entry: {}", e),
        }
    }
    entries
}
