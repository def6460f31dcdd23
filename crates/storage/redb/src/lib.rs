//! redb-based chain database.
//!
//! [`RedbStore`] keeps every chain key in a single table of the embedded redb
//! database at `<path>/chaindata.redb`.

use std::fs;
use std::path::{Path, PathBuf};

use hearth_storage::{KeyValueStore, StorageError, StorageResult, StoreOptions};
use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info};

/// Name of the database file inside the node database directory.
pub const DATABASE_FILE_NAME: &str = "chaindata.redb";

/// Key: raw key bytes. Value: raw value bytes.
const CHAIN_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("chain");

/// redb-backed [`KeyValueStore`].
#[derive(Debug)]
pub struct RedbStore {
    path: PathBuf,
    db: RwLock<Option<Database>>,
}

impl RedbStore {
    /// Open or create the database in directory `path`.
    ///
    /// Only `cache_size_mb` is applied. redb keeps a single file open, so
    /// `max_file_handles` is ignored.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> StorageResult<Self> {
        let dir = path.as_ref();
        let open_err = |reason: String| StorageError::Open {
            path: dir.to_path_buf(),
            reason,
        };

        fs::create_dir_all(dir).map_err(|e| open_err(e.to_string()))?;
        let file = dir.join(DATABASE_FILE_NAME);

        let cache_bytes = usize::try_from(options.cache_size_mb.saturating_mul(1024 * 1024))
            .unwrap_or(usize::MAX);

        let db = redb::Builder::new()
            .set_cache_size(cache_bytes)
            .create(&file)
            .map_err(|e| open_err(e.to_string()))?;

        // Ensure the chain table exists
        let write_txn = db.begin_write().map_err(|e| open_err(e.to_string()))?;
        {
            let _ = write_txn
                .open_table(CHAIN_TABLE)
                .map_err(|e| open_err(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| open_err(e.to_string()))?;

        info!(
            path = %file.display(),
            cache_mb = options.cache_size_mb,
            "Opened chain database"
        );

        Ok(Self {
            path: file,
            db: RwLock::new(Some(db)),
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&Database) -> StorageResult<T>) -> StorageResult<T> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(StorageError::Closed)?;
        f(db)
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.read(|db| {
            let read_txn = db.begin_read().map_err(StorageError::backend)?;
            let table = read_txn
                .open_table(CHAIN_TABLE)
                .map_err(StorageError::backend)?;
            let value = table.get(key).map_err(StorageError::backend)?;
            Ok(value.map(|v| v.value().to_vec()))
        })
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.read(|db| {
            let write_txn = db.begin_write().map_err(StorageError::backend)?;
            {
                let mut table = write_txn
                    .open_table(CHAIN_TABLE)
                    .map_err(StorageError::backend)?;
                table.insert(key, value).map_err(StorageError::backend)?;
            }
            write_txn.commit().map_err(StorageError::backend)
        })
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.read(|db| {
            let write_txn = db.begin_write().map_err(StorageError::backend)?;
            {
                let mut table = write_txn
                    .open_table(CHAIN_TABLE)
                    .map_err(StorageError::backend)?;
                table.remove(key).map_err(StorageError::backend)?;
            }
            write_txn.commit().map_err(StorageError::backend)
        })
    }

    fn close(&self) -> StorageResult<()> {
        if self.db.write().take().is_some() {
            debug!(path = %self.path.display(), "Closed chain database");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.db.read().is_none()
    }
}
