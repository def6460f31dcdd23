//! Key-value storage used by the chain database.
//!
//! Backends implement [`KeyValueStore`]. A store is opened once per node and
//! shared by the chain engine while it runs; the node closes it only after
//! every dependent component has stopped.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default database cache in megabytes.
pub const DEFAULT_CACHE_SIZE_MB: u64 = 128;

/// Default open file handle allowance.
pub const DEFAULT_MAX_FILE_HANDLES: u32 = 256;

/// Tuning hints passed to a backend at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Cache size hint in megabytes.
    pub cache_size_mb: u64,
    /// Maximum number of open file handles the backend may use. Advisory:
    /// single-file backends such as redb ignore it.
    pub max_file_handles: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cache_size_mb: DEFAULT_CACHE_SIZE_MB,
            max_file_handles: DEFAULT_MAX_FILE_HANDLES,
        }
    }
}

/// Storage error type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Failed to open the database.
    #[error("failed to open database at {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    /// The store has already been closed.
    #[error("database is closed")]
    Closed,
    /// Failed to decode a stored value.
    #[error("failed to decode value for key {key}: {reason}")]
    Decode { key: String, reason: String },
    /// Error reported by the storage backend.
    #[error("database backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Wrap any backend error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A flat, byte-oriented key-value store.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    fn delete(&self, key: &[u8]) -> StorageResult<()>;

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Release the backend. Idempotent; later operations fail with
    /// [`StorageError::Closed`].
    fn close(&self) -> StorageResult<()>;

    fn is_closed(&self) -> bool;
}

/// In-memory store (no persistence).
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.is_closed() {
            return Err(StorageError::Closed);
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.ensure_open()?;
        self.entries.write().remove(key);
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.entries.write().clear();
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
