//! # Queue Notification Bus
//!
//! Lets any number of UI surfaces follow the unsynced queue without polling.
//! Listeners are plain callbacks invoked synchronously with the full queue
//! snapshot after every mutation.
//!
//! A listener that panics is logged and skipped; the remaining listeners are
//! still called and the queue is unaffected. Listeners run outside the
//! registry lock, so a listener may subscribe or unsubscribe others.

use crate::client::offline::queue::QueueEntry;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Callback receiving the current queue snapshot
pub type QueueListener = Arc<dyn Fn(&[QueueEntry]) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, QueueListener>>,
}

/// Registry of queue listeners
#[derive(Clone, Default)]
pub struct NotificationBus {
    registry: Arc<Registry>,
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("listeners", &self.len())
            .finish()
    }
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and call it once with `snapshot`
    pub fn subscribe_with_snapshot(
        &self,
        listener: QueueListener,
        snapshot: &[QueueEntry],
    ) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut listeners) = self.registry.listeners.lock() {
            listeners.insert(id, listener.clone());
        }
        invoke(id, &listener, snapshot);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Call every listener with `snapshot`; returns how many returned normally
    pub fn notify(&self, snapshot: &[QueueEntry]) -> usize {
        let listeners: Vec<(u64, QueueListener)> = match self.registry.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(id, l)| (*id, l.clone())).collect(),
            Err(_) => {
                tracing::error!("[Queue] Listener registry poisoned; skipping notification");
                return 0;
            }
        };

        listeners
            .iter()
            .filter(|(id, listener)| invoke(*id, listener, snapshot))
            .count()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.registry.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn invoke(id: u64, listener: &QueueListener, snapshot: &[QueueEntry]) -> bool {
    match catch_unwind(AssertUnwindSafe(|| listener(snapshot))) {
        Ok(()) => true,
        Err(_) => {
            tracing::error!("[Queue] Listener {} panicked; other listeners unaffected", id);
            false
        }
    }
}

/// Handle returned by `subscribe`; dropping it keeps the listener registered
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener; returns false if it was already gone
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        registry
            .listeners
            .lock()
            .map(|mut listeners| listeners.remove(&self.id).is_some())
            .unwrap_or(false)
    }
}
