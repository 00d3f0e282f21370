//! Session store: the key/value persistence behind a wallet session
//!
//! Values are plain strings with no schema versioning. The store is the only
//! persistence; concurrent writers are last-writer-wins.

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sentinel_types::{Result, WalletError};

/// Store keys
pub mod keys {
    pub const WALLET_ADDRESS: &str = "walletAddress";
    pub const TOTAL_BALANCE: &str = "totalBalance";
    pub const AVAILABLE_BALANCE: &str = "availableBalance";
    pub const DASHBOARD_BALANCE: &str = "dashboardBalance";

    /// Every key a session writes
    pub const ALL: [&str; 4] = [
        WALLET_ADDRESS,
        TOTAL_BALANCE,
        AVAILABLE_BALANCE,
        DASHBOARD_BALANCE,
    ];
}

/// String key/value storage
pub trait SessionStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value (no-op when absent)
    fn remove(&self, key: &str) -> Result<()>;
}

// ============================================================================
// Memory store
// ============================================================================

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with entries
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.entries.write();
            for (k, v) in entries {
                map.insert(k.to_string(), v.to_string());
            }
        }
        store
    }

    /// Copy of every entry
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

/// JSON object on disk, re-read on every access so that other processes'
/// writes are visible
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) a store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Default location: `<data dir>/cryptosentinel/session.json`
    pub fn default_path(data_dir: &Path) -> PathBuf {
        data_dir.join("cryptosentinel").join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                WalletError::storage(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_map()?;
        if f(&mut map) {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| map.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get(keys::WALLET_ADDRESS).unwrap(), None);

        store.set(keys::WALLET_ADDRESS, "0xabc").unwrap();
        assert_eq!(store.get(keys::WALLET_ADDRESS).unwrap().as_deref(), Some("0xabc"));

        store.remove(keys::WALLET_ADDRESS).unwrap();
        store.remove(keys::WALLET_ADDRESS).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(keys::TOTAL_BALANCE).unwrap(), None);
        store.set(keys::TOTAL_BALANCE, "$21.05").unwrap();
        store.set(keys::DASHBOARD_BALANCE, "4231.89").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::TOTAL_BALANCE).unwrap().as_deref(), Some("$21.05"));

        reopened.remove(keys::TOTAL_BALANCE).unwrap();
        assert_eq!(store.get(keys::TOTAL_BALANCE).unwrap(), None);
        assert_eq!(store.get(keys::DASHBOARD_BALANCE).unwrap().as_deref(), Some("4231.89"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(matches!(
            store.get(keys::WALLET_ADDRESS),
            Err(WalletError::Storage { .. })
        ));
    }

    #[test]
    fn test_default_path() {
        let path = FileStore::default_path(Path::new("/data"));
        assert_eq!(path, PathBuf::from("/data/cryptosentinel/session.json"));
    }
}
