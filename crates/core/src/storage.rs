//! Key/value storage slots for registry snapshots.
//!
//! The registry persists into named string slots, one value per key, with
//! whole-value overwrite semantics. Two backends are provided:
//!
//! - [`FileStorage`]: one file per key under a data directory, written through a
//!   temporary file and renamed into place.
//! - [`MemoryStorage`]: a process-local map, used when durable storage is
//!   unavailable and in tests. An optional quota makes write failures reproducible.

use crate::constants::PROBE_STORAGE_KEY;
use crate::error::{StorageError, StorageResult};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const MAX_KEY_LEN: usize = 128;

/// Validates that a key can name a storage slot (and therefore a file).
///
/// Keys are restricted to ASCII alphanumerics plus `.`, `-` and `_`, and must not start
/// with a dot.
pub fn validate_storage_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StorageError::InvalidKey(format!(
            "key must be 1..={MAX_KEY_LEN} characters"
        )));
    }

    if key.starts_with('.') {
        return Err(StorageError::InvalidKey(format!(
            "key must not start with '.': {key}"
        )));
    }

    let ok = key
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));
    if !ok {
        return Err(StorageError::InvalidKey(format!(
            "key contains invalid characters (only alphanumeric, '.', '-', '_' allowed): {key}"
        )));
    }

    Ok(())
}

/// A string-valued key/value store with overwrite semantics.
pub trait StorageBackend {
    /// Returns the stored value, or `Ok(None)` when the key has never been written.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Overwrites the value stored under `key`.
    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> StorageResult<()>;

    /// Whether values survive the current process.
    fn is_durable(&self) -> bool;

    /// Checks the backend accepts writes by writing and removing a throwaway key.
    fn probe(&mut self) -> StorageResult<()> {
        self.set_item(PROBE_STORAGE_KEY, "1")?;
        self.remove_item(PROBE_STORAGE_KEY)
    }
}

/// File-per-key storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates a backend rooted at `root`. The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_storage_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.root)?;

        let tmp = self.root.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::Io(e));
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn is_durable(&self) -> bool {
        true
    }
}

/// In-process storage. Values are lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects any value larger than `limit` bytes.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            slots: HashMap::new(),
            quota: Some(limit),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.slots.remove(key);
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

/// Probes `backend` and falls back to session-only memory storage when it refuses writes.
pub fn usable_or_memory(mut backend: Box<dyn StorageBackend>) -> Box<dyn StorageBackend> {
    match backend.probe() {
        Ok(()) => backend,
        Err(e) => {
            tracing::warn!("local storage unavailable, persistence disabled: {}", e);
            tracing::info!("registry data will be kept for the current session only");
            Box::new(MemoryStorage::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_storage_round_trips_and_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut storage = FileStorage::new(temp_dir.path().join("data"));

        assert_eq!(storage.get_item("tcth-registry-v1").unwrap(), None);

        storage.set_item("tcth-registry-v1", "{\"a\":1}").unwrap();
        storage.set_item("tcth-registry-v1", "{\"a\":2}").unwrap();
        assert_eq!(
            storage.get_item("tcth-registry-v1").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        assert!(temp_dir.path().join("data/tcth-registry-v1.json").is_file());
        assert!(!temp_dir.path().join("data/.tcth-registry-v1.json.tmp").exists());

        storage.remove_item("tcth-registry-v1").unwrap();
        storage.remove_item("tcth-registry-v1").unwrap();
        assert_eq!(storage.get_item("tcth-registry-v1").unwrap(), None);
    }

    #[test]
    fn file_storage_rejects_path_keys() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut storage = FileStorage::new(temp_dir.path());
        let err = storage.set_item("../outside", "x").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
        assert!(matches!(
            validate_storage_key(".hidden"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn probe_leaves_no_trace() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut storage = FileStorage::new(temp_dir.path());
        storage.probe().expect("probe should succeed");
        assert_eq!(storage.get_item(PROBE_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn probe_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let backend = usable_or_memory(Box::new(FileStorage::new(&blocker)));
        assert!(!backend.is_durable(), "should fall back to memory storage");
    }

    #[test]
    fn memory_quota_rejects_large_values() {
        let mut storage = MemoryStorage::with_quota(4);
        storage.set_item("k", "1234").unwrap();
        let err = storage.set_item("k", "12345").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 4, .. }));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("1234"));
    }
}
