use async_trait::async_trait;
use serde_json::Value;
use storage::{
    IndexedDbStore, KeyValueBackend, LocalStorageBackend, MemoryBackend, ObjectStore,
    StorageError, StorageKeys, UnsupportedObjectStore,
};

/// `localStorage` when the browser allows it, otherwise an in-memory map that
/// lasts until reload.
#[derive(Debug)]
pub enum HostBackend {
    Local(LocalStorageBackend),
    Memory(MemoryBackend),
}

impl HostBackend {
    pub fn new() -> Self {
        match LocalStorageBackend::new() {
            Ok(s) => HostBackend::Local(s),
            Err(err) => {
                tracing::warn!(%err, "localStorage unavailable; setup record kept in memory");
                HostBackend::Memory(MemoryBackend::new())
            }
        }
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueBackend for HostBackend {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            HostBackend::Local(s) => s.get_raw(key),
            HostBackend::Memory(s) => s.get_raw(key),
        }
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            HostBackend::Local(s) => s.set_raw(key, value),
            HostBackend::Memory(s) => s.set_raw(key, value),
        }
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match self {
            HostBackend::Local(s) => s.clear(),
            HostBackend::Memory(s) => s.clear(),
        }
    }
}

/// IndexedDB, or the no-op tier on browsers without it.
#[derive(Debug, Clone)]
pub enum HostObjectStore {
    IndexedDb(IndexedDbStore),
    Unsupported(UnsupportedObjectStore),
}

impl HostObjectStore {
    pub fn new(keys: &StorageKeys) -> Self {
        match IndexedDbStore::new(keys) {
            Ok(s) => HostObjectStore::IndexedDb(s),
            Err(err) => {
                tracing::warn!(%err, "IndexedDB unavailable; boundary cache disabled");
                HostObjectStore::Unsupported(UnsupportedObjectStore)
            }
        }
    }
}

#[async_trait(?Send)]
impl ObjectStore for HostObjectStore {
    fn is_supported(&self) -> bool {
        match self {
            HostObjectStore::IndexedDb(s) => s.is_supported(),
            HostObjectStore::Unsupported(s) => s.is_supported(),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self {
            HostObjectStore::IndexedDb(s) => s.get(key).await,
            HostObjectStore::Unsupported(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<Option<Value>, StorageError> {
        match self {
            HostObjectStore::IndexedDb(s) => s.set(key, value).await,
            HostObjectStore::Unsupported(s) => s.set(key, value).await,
        }
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match self {
            HostObjectStore::IndexedDb(s) => s.clear().await,
            HostObjectStore::Unsupported(s) => s.clear().await,
        }
    }
}
