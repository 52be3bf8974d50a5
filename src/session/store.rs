//! Merchant Record Store
//!
//! One durable JSON file per merchant identity plus an in-memory cache.
//! The cache is the source of truth while the process runs; every mutation
//! is flushed to disk before it becomes visible in the cache, so a failed
//! write leaves the cached record unchanged.
//!
//! Shared as `Arc<RwLock<MerchantStore>>`; holding the write lock across a
//! load-mutate-save sequence serializes mutations per identity.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use super::types::MerchantRecord;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt record at {path}: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },

    #[error("failed to serialize record for {identity}: {source}")]
    Serialize {
        identity: String,
        source: serde_json::Error,
    },
}

/// Per-merchant persisted record store with in-memory cache
pub struct MerchantStore {
    data_dir: PathBuf,
    records: HashMap<String, MerchantRecord>,
}

/// Shared store handle
pub type SharedMerchantStore = Arc<RwLock<MerchantStore>>;

impl MerchantStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            data_dir,
            records: HashMap::new(),
        })
    }

    /// Wrap a store for shared access
    pub fn into_shared(self) -> SharedMerchantStore {
        Arc::new(RwLock::new(self))
    }

    /// Get the record for `identity`, loading from disk on first access
    ///
    /// A missing file yields a default record; corrupt JSON is an error.
    pub fn get(&mut self, identity: &str) -> Result<MerchantRecord, StoreError> {
        if let Some(record) = self.records.get(identity) {
            return Ok(record.clone());
        }

        let record = self.load(identity)?;
        self.records.insert(identity.to_string(), record.clone());
        Ok(record)
    }

    /// Persist `record` for `identity` and update the cache
    ///
    /// Writes the full JSON to a temp file and renames it over the record
    /// path, so readers never observe a partial write. The cache is only
    /// updated after the rename succeeds.
    pub fn save(&mut self, identity: &str, record: MerchantRecord) -> Result<(), StoreError> {
        let path = self.record_path(identity);
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(&record).map_err(|source| StoreError::Serialize {
            identity: identity.to_string(),
            source,
        })?;

        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;

        self.records.insert(identity.to_string(), record);
        Ok(())
    }

    /// Number of records in the in-memory cache
    pub fn cached_count(&self) -> usize {
        self.records.len()
    }

    /// Path of the durable record for `identity`
    pub fn record_path(&self, identity: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize_identity(identity)))
    }

    fn load(&self, identity: &str) -> Result<MerchantRecord, StoreError> {
        let path = self.record_path(identity);
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.display().to_string(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(MerchantRecord::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Filesystem-safe transform of an identity string
///
/// Hardware addresses contain `:`, which is reserved on some filesystems;
/// anything outside `[A-Za-z0-9_-]` maps to `-`.
pub fn sanitize_identity(identity: &str) -> String {
    identity
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::TransferRecord;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_identity() {
        assert_eq!(sanitize_identity("aa:bb:cc:dd:ee:ff"), "aa-bb-cc-dd-ee-ff");
        assert_eq!(sanitize_identity("unknown-mac"), "unknown-mac");
        assert_eq!(sanitize_identity("../etc/passwd"), "---etc-passwd");
    }

    #[test]
    fn test_get_missing_record_is_default() {
        let dir = tempdir().unwrap();
        let mut store = MerchantStore::new(dir.path()).unwrap();

        let record = store.get("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(record, MerchantRecord::default());
        assert_eq!(store.cached_count(), 1);
    }

    #[test]
    fn test_durability_round_trip() {
        let dir = tempdir().unwrap();
        let identity = "aa:bb:cc:dd:ee:ff";

        let saved = MerchantRecord {
            token: Some("data:text/plain;base64,dG9r".to_string()),
            identity: Some(identity.to_string()),
            transfers: vec![TransferRecord::new(
                "invoice.pdf".to_string(),
                "cGRm".to_string(),
            )],
        };

        {
            let mut store = MerchantStore::new(dir.path()).unwrap();
            store.save(identity, saved.clone()).unwrap();
            assert!(store.record_path(identity).exists());
        }

        // Fresh store, empty cache: must reload from disk
        let mut store = MerchantStore::new(dir.path()).unwrap();
        let loaded = store.get(identity).unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_save_overwrites_in_full() {
        let dir = tempdir().unwrap();
        let identity = "aa:bb:cc:dd:ee:ff";
        let mut store = MerchantStore::new(dir.path()).unwrap();

        let mut record = MerchantRecord::default();
        record
            .transfers
            .push(TransferRecord::new("a.txt".to_string(), "YQ==".to_string()));
        store.save(identity, record).unwrap();

        store.save(identity, MerchantRecord::default()).unwrap();

        let mut reloaded = MerchantStore::new(dir.path()).unwrap();
        assert_eq!(reloaded.get(identity).unwrap(), MerchantRecord::default());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempdir().unwrap();
        let identity = "aa:bb:cc:dd:ee:ff";
        let mut store = MerchantStore::new(dir.path()).unwrap();

        fs::write(store.record_path(identity), b"{not json").unwrap();

        assert!(matches!(
            store.get(identity),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_failed_save_leaves_cache_unchanged() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("store");
        let mut store = MerchantStore::new(&data_dir).unwrap();

        let identity = "aa:bb:cc:dd:ee:ff";
        store.get(identity).unwrap();

        // Replace the data directory with a plain file so writes fail
        fs::remove_dir_all(&data_dir).unwrap();
        fs::write(&data_dir, b"").unwrap();

        let mut mutated = MerchantRecord::default();
        mutated
            .transfers
            .push(TransferRecord::new("x.bin".to_string(), "eA==".to_string()));

        assert!(store.save(identity, mutated).is_err());
        assert!(store.get(identity).unwrap().transfers.is_empty());
    }
}
