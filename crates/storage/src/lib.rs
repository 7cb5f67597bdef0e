//! Client-side persistence tiers.
//!
//! Two independent tiers back the wizard across reloads: a synchronous
//! key-value tier (`localStorage` in the browser) and an asynchronous object
//! store (IndexedDB). Neither is authoritative; the server is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod kv;
pub mod object_store;
pub mod web;

pub use kv::{KeyValueBackend, KeyValueTier, MemoryBackend};
pub use object_store::{MemoryObjectStore, ObjectStore, UnsupportedObjectStore};
pub use web::{IndexedDbStore, LocalStorageBackend};

#[derive(Debug, Error)]
pub enum StorageError {
    /// The browser does not expose the backing store (or we are off-wasm).
    #[error("browser storage unavailable")]
    Unavailable,
    #[error("storage corrupt: {0}")]
    Corrupt(String),
    /// Backend refused the operation, e.g. quota exceeded.
    #[error("storage error: {0}")]
    Io(String),
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Names under which the wizard persists its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// Key-value entry holding the server's `AppConfig` record.
    pub app_config: String,
    /// Object-store entry holding the uploaded boundary.
    pub app_geojson: String,
    pub database: String,
    pub object_store: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            app_config: "APP_CONFIG".to_string(),
            app_geojson: "APP_GEOJSON".to_string(),
            database: "app-storage".to_string(),
            object_store: "keyval".to_string(),
        }
    }
}
