use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::StorageError;

/// Asynchronous tier for payloads too large for the key-value tier.
#[async_trait(?Send)]
pub trait ObjectStore {
    /// `false` when the browser has no backing store; every call is then a no-op.
    fn is_supported(&self) -> bool;

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Returns the stored value, or `None` when nothing was persisted.
    async fn set(&self, key: &str, value: Value) -> Result<Option<Value>, StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}

/// Degraded tier for browsers without IndexedDB.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedObjectStore;

#[async_trait(?Send)]
impl ObjectStore for UnsupportedObjectStore {
    fn is_supported(&self) -> bool {
        false
    }

    async fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
        Ok(None)
    }

    async fn set(&self, key: &str, _value: Value) -> Result<Option<Value>, StorageError> {
        tracing::debug!(key, "object store unsupported; value not cached");
        Ok(None)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    entries: RefCell<HashMap<String, Value>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[async_trait(?Send)]
impl ObjectStore for MemoryObjectStore {
    fn is_supported(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<Option<Value>, StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        Ok(Some(value))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}
