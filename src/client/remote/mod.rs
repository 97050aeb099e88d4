//! # Remote Document Store
//!
//! The contract the offline subsystem consumes from the backend: an upsert
//! keyed by document id, a point read, and a scan by type.
//!
//! - `HttpDocumentStore`: the EngageIQ REST backend
//! - `MemoryDocumentStore`: in-process store with failure injection, used by
//!   tests and local simulations
//! - `reporter`: the best-effort error sink

pub mod http;
pub mod reporter;

pub use http::HttpDocumentStore;
pub use reporter::{
    ErrorReport, ErrorReporter, MemoryErrorReporter, StoreErrorReporter, TracingErrorReporter,
};

use crate::shared::{RemoteDocument, SyncError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Remote document store client
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Upsert a document by id; returns the persisted document
    async fn create(&self, document: RemoteDocument) -> Result<RemoteDocument, SyncError>;

    /// Read one document, `None` when absent
    async fn read(&self, id: &str, doc_type: &str) -> Result<Option<RemoteDocument>, SyncError>;

    /// All documents of a type
    async fn query_by_type(&self, doc_type: &str) -> Result<Vec<RemoteDocument>, SyncError>;
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<(String, String), RemoteDocument>>,
    offline: AtomicBool,
    failing_ids: Mutex<HashSet<String>>,
    create_calls: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the network were down
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make writes of one document id fail
    pub fn fail_id(&self, id: impl Into<String>) {
        if let Ok(mut ids) = self.failing_ids.lock() {
            ids.insert(id.into());
        }
    }

    /// Stop failing writes of one document id
    pub fn heal_id(&self, id: &str) {
        if let Ok(mut ids) = self.failing_ids.lock() {
            ids.remove(id);
        }
    }

    /// Number of `create` calls received, failed ones included
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Stored document, bypassing the offline switch
    pub fn get(&self, doc_type: &str, id: &str) -> Option<RemoteDocument> {
        self.documents
            .lock()
            .ok()?
            .get(&(doc_type.to_string(), id.to_string()))
            .cloned()
    }

    /// Number of stored documents of a type
    pub fn count(&self, doc_type: &str) -> usize {
        self.documents
            .lock()
            .map(|docs| docs.keys().filter(|(t, _)| t == doc_type).count())
            .unwrap_or(0)
    }

    fn check_online(&self) -> Result<(), SyncError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::remote("store unreachable"));
        }
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<(String, String), RemoteDocument>>, SyncError>
    {
        self.documents
            .lock()
            .map_err(|_| SyncError::remote("memory store lock poisoned"))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, document: RemoteDocument) -> Result<RemoteDocument, SyncError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let failing = self
            .failing_ids
            .lock()
            .map(|ids| ids.contains(&document.id))
            .unwrap_or(false);
        if failing {
            return Err(SyncError::remote_status(503, format!("write of {} rejected", document.id)));
        }

        let mut documents = self.lock()?;
        documents.insert((document.doc_type.clone(), document.id.clone()), document.clone());
        Ok(document)
    }

    async fn read(&self, id: &str, doc_type: &str) -> Result<Option<RemoteDocument>, SyncError> {
        self.check_online()?;
        let documents = self.lock()?;
        Ok(documents.get(&(doc_type.to_string(), id.to_string())).cloned())
    }

    async fn query_by_type(&self, doc_type: &str) -> Result<Vec<RemoteDocument>, SyncError> {
        self.check_online()?;
        let documents = self.lock()?;
        Ok(documents
            .iter()
            .filter(|((t, _), _)| t == doc_type)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}
