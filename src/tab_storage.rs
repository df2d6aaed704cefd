//! Tab-scoped key/value storage for the auth token.
//!
//! Each tab owns exactly one storage instance. Nothing here is shared
//! between tabs: the in-memory store lives and dies with its tab, and the
//! file store keeps one file per tab id.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Storage key holding the bearer token.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Errors from tab storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupted storage file: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Internal lock error")]
    LockPoisoned,
}

/// Per-tab persistent key/value store.
pub trait TabStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ═══════════════════════════════════════════════════════════
// MemoryTabStorage
// ═══════════════════════════════════════════════════════════

/// Storage that lives as long as the tab does.
#[derive(Default)]
pub struct MemoryTabStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTabStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl TabStorage for MemoryTabStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// FileTabStorage
// ═══════════════════════════════════════════════════════════

/// Storage persisted to `<dir>/<sha256(tab_id)>.json`.
///
/// The same tab id reopens the same entries after a restart. Different tab
/// ids never see each other's entries. Writes land in a temp file in the
/// same directory and are renamed into place.
pub struct FileTabStorage {
    path: PathBuf,
    tab_id: String,
    write_lock: Mutex<()>,
}

impl FileTabStorage {
    /// Open (or lazily create) the storage for `tab_id` under `dir`.
    pub fn open(dir: &Path, tab_id: impl Into<String>) -> Result<Self, StorageError> {
        let tab_id = tab_id.into();
        std::fs::create_dir_all(dir)?;
        set_dir_permissions(dir)?;
        let file_name = format!("{:x}.json", Sha256::digest(tab_id.as_bytes()));
        Ok(Self {
            path: dir.join(file_name),
            tab_id,
            write_lock: Mutex::new(()),
        })
    }

    /// Storage for a brand-new tab with a random id.
    pub fn new_tab(dir: &Path) -> Result<Self, StorageError> {
        Self::open(dir, Uuid::new_v4().to_string())
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        staged.write_all(&serde_json::to_vec(entries)?)?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

impl TabStorage for FileTabStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockPoisoned)?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockPoisoned)?;
        let mut entries = self.load()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.save(&entries)
    }
}

/// Set directory permissions to owner-only (0o700 on Unix).
#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryTabStorage::new();
        assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());

        storage.set(AUTH_TOKEN_KEY, "tok-1").unwrap();
        assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));

        storage.set(AUTH_TOKEN_KEY, "tok-2").unwrap();
        assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("tok-2"));

        storage.remove(AUTH_TOKEN_KEY).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn memory_storage_remove_missing_is_ok() {
        let storage = MemoryTabStorage::new();
        storage.remove(AUTH_TOKEN_KEY).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn separate_memory_tabs_do_not_share() {
        let tab_a = MemoryTabStorage::new();
        let tab_b = MemoryTabStorage::new();
        tab_a.set(AUTH_TOKEN_KEY, "a").unwrap();
        assert!(tab_b.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn file_storage_survives_reopen_for_same_tab() {
        let dir = test_dir();
        {
            let storage = FileTabStorage::open(dir.path(), "tab-1").unwrap();
            storage.set(AUTH_TOKEN_KEY, "tok").unwrap();
        }
        let reopened = FileTabStorage::open(dir.path(), "tab-1").unwrap();
        assert_eq!(reopened.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn file_storage_is_isolated_per_tab() {
        let dir = test_dir();
        let tab_a = FileTabStorage::open(dir.path(), "tab-a").unwrap();
        let tab_b = FileTabStorage::open(dir.path(), "tab-b").unwrap();

        tab_a.set(AUTH_TOKEN_KEY, "alice").unwrap();
        tab_b.set(AUTH_TOKEN_KEY, "bob").unwrap();

        assert_eq!(tab_a.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("alice"));
        assert_eq!(tab_b.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("bob"));
        assert_ne!(tab_a.path(), tab_b.path());
    }

    #[test]
    fn file_name_does_not_leak_tab_id() {
        let dir = test_dir();
        let storage = FileTabStorage::open(dir.path(), "../../etc/passwd").unwrap();
        assert_eq!(storage.path().parent().unwrap(), dir.path());
        let name = storage.path().file_name().unwrap().to_str().unwrap();
        assert!(!name.contains("passwd"));
        assert_eq!(storage.tab_id(), "../../etc/passwd");
    }

    #[test]
    fn removing_last_key_deletes_file() {
        let dir = test_dir();
        let storage = FileTabStorage::new_tab(dir.path()).unwrap();
        storage.set(AUTH_TOKEN_KEY, "tok").unwrap();
        assert!(storage.path().exists());

        storage.remove(AUTH_TOKEN_KEY).unwrap();
        assert!(!storage.path().exists());
        assert!(storage.get(AUTH_TOKEN_KEY).unwrap().is_none());

        // Second remove is a no-op
        storage.remove(AUTH_TOKEN_KEY).unwrap();
    }

    #[test]
    fn corrupted_file_reports_serialization_error() {
        let dir = test_dir();
        let storage = FileTabStorage::open(dir.path(), "tab").unwrap();
        std::fs::write(storage.path(), b"{not json").unwrap();

        match storage.get(AUTH_TOKEN_KEY) {
            Err(StorageError::Serialization(_)) => {}
            other => panic!("Expected Serialization error, got: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn storage_dir_has_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = test_dir();
        let nested = dir.path().join("tabs");
        FileTabStorage::open(&nested, "tab").unwrap();
        let mode = std::fs::metadata(&nested).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
