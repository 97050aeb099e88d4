//! # Local Storage Module
//!
//! Durable key-value storage for the unsynced queue. The queue stores its
//! whole snapshot under one key, so the contract is deliberately small:
//! `get` returns the last value written (or `None`), `set` replaces it.
//!
//! ## Implementations
//!
//! - `SqliteStorage`: a `local_storage` key-value table in a local SQLite
//!   database, opened in WAL mode under the platform data directory.
//! - `MemoryStorage`: process-local map. Clones share state, which lets tests
//!   simulate a restart by opening a second queue over the same handle.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use engageiq_sync::client::local_db::{LocalStorage, SqliteStorage};
//!
//! # async fn example() -> Result<(), engageiq_sync::shared::SyncError> {
//! let storage = SqliteStorage::open_default().await?;
//! storage.set("engageiq.unsynced", "[]").await?;
//! assert_eq!(storage.get("engageiq.unsynced").await?.as_deref(), Some("[]"));
//! # Ok(())
//! # }
//! ```

use crate::shared::SyncError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Result type for local storage operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Durable string storage addressed by key
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory storage; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| SyncError::storage("memory storage lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| SyncError::storage("memory storage lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed key-value storage
///
/// Values live in a single `local_storage` table keyed by string. The pool
/// is cheap to clone.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Database file name inside a data directory
    pub const FILE_NAME: &'static str = "local.db";

    /// Open or create the database at `path`
    ///
    /// Creates the parent directory and the database file if needed, then
    /// initializes the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // WAL mode and relaxed sync apply to every pooled connection
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePool::connect_with(options).await?;

        Self::with_pool(pool).await
    }

    /// Open the database in the platform data directory
    pub async fn open_default() -> Result<Self> {
        Self::open(Self::default_path()).await
    }

    /// A private in-memory database, gone when the last clone is dropped
    pub async fn in_memory() -> Result<Self> {
        // every connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    /// Platform-specific database path, falling back to the temp dir
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("engageiq");
        path.push(Self::FILE_NAME);
        path
    }

    /// Get connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl LocalStorage for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO local_storage (key, value, updated_at)
             VALUES (?, ?, ?)",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
