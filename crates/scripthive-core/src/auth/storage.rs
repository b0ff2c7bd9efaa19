//! Persistent key-value storage backing the session store.
//!
//! Values are opaque strings. Three backends are provided: one JSON file per
//! key in the data directory, the OS keychain, and a process-local map.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use keyring::Entry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("serializing the session failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("refusing to persist an incomplete session")]
    IncompleteSession,
}

pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        // Invalid UTF-8 is read lossily; callers reject it as malformed.
        let bytes = std::fs::read(path)?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Values kept in the OS keychain, one entry per key under a service name.
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl KeyValueStorage for KeyringStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::BadEncoding(bytes)) => {
                Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Backend chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum Storage {
    File(FileStorage),
    Keyring(KeyringStorage),
    Memory(MemoryStorage),
}

impl KeyValueStorage for Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Storage::File(s) => s.get(key),
            Storage::Keyring(s) => s.get(key),
            Storage::Memory(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Storage::File(s) => s.set(key, value),
            Storage::Keyring(s) => s.set(key, value),
            Storage::Memory(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Storage::File(s) => s.remove(key),
            Storage::Keyring(s) => s.remove(key),
            Storage::Memory(s) => s.remove(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "scripthive-storage-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = temp_dir("roundtrip");
        let storage = FileStorage::new(dir.clone());

        assert_eq!(storage.get("user").unwrap(), None);
        storage.set("user", "{\"a\":1}").unwrap();
        assert_eq!(storage.get("user").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(dir.join("user.json").exists());

        storage.remove("user").unwrap();
        assert_eq!(storage.get("user").unwrap(), None);
        // Removing a missing key is not an error
        storage.remove("user").unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_memory_storage_clones_share_state() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();

        storage.set("user", "x").unwrap();
        assert!(handle.contains("user"));
        handle.remove("user").unwrap();
        assert_eq!(storage.get("user").unwrap(), None);
    }

    #[test]
    fn test_storage_enum_dispatch() {
        let memory = MemoryStorage::new();
        let storage = Storage::Memory(memory.clone());
        storage.set("k", "v").unwrap();
        assert_eq!(memory.get("k").unwrap().as_deref(), Some("v"));
    }
}
