//! Browser-backed tiers. Off-wasm every constructor reports `Unavailable`.

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use async_trait::async_trait;
    use serde_json::Value;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;

    use crate::kv::KeyValueBackend;
    use crate::object_store::ObjectStore;
    use crate::{StorageError, StorageKeys};

    #[derive(Debug)]
    pub struct LocalStorageBackend {
        storage: web_sys::Storage,
    }

    impl LocalStorageBackend {
        pub fn new() -> Result<Self, StorageError> {
            Ok(Self {
                storage: window_local_storage()?,
            })
        }
    }

    impl KeyValueBackend for LocalStorageBackend {
        fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.storage
                .get_item(key)
                .map_err(|e| StorageError::Io(format!("get_item failed: {:?}", e)))
        }

        fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.storage
                .set_item(key, value)
                .map_err(|e| StorageError::Io(format!("set_item failed: {:?}", e)))
        }

        fn clear(&mut self) -> Result<(), StorageError> {
            self.storage
                .clear()
                .map_err(|e| StorageError::Io(format!("clear failed: {:?}", e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, StorageError> {
        let win = web_sys::window().ok_or(StorageError::Unavailable)?;
        win.local_storage()
            .map_err(|e| StorageError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(StorageError::Unavailable)
    }

    // The database is opened at most once per (database, store) pair.
    #[wasm_bindgen(inline_js = "
const __setup_idb_promises = new Map();

function __setup_open_db(dbName, storeName) {
    const cacheKey = dbName + '/' + storeName;
    if (__setup_idb_promises.has(cacheKey)) return __setup_idb_promises.get(cacheKey);

    const promise = new Promise((resolve, reject) => {
        try {
            const req = indexedDB.open(dbName, 1);
            req.onupgradeneeded = () => {
                const db = req.result;
                if (!db.objectStoreNames.contains(storeName)) {
                    db.createObjectStore(storeName);
                }
            };
            req.onsuccess = () => resolve(req.result);
            req.onerror = () => reject(req.error || new Error('IndexedDB open failed'));
        } catch (e) {
            reject(e);
        }
    });
    promise.catch(() => __setup_idb_promises.delete(cacheKey));
    __setup_idb_promises.set(cacheKey, promise);
    return promise;
}

export function setup_idb_supported() {
    return typeof indexedDB !== 'undefined' && indexedDB !== null;
}

export async function setup_idb_put(dbName, storeName, key, text) {
    const db = await __setup_open_db(dbName, storeName);
    return await new Promise((resolve, reject) => {
        try {
            const tx = db.transaction([storeName], 'readwrite');
            tx.objectStore(storeName).put(text, key);
            tx.oncomplete = () => resolve(true);
            tx.onerror = () => reject(tx.error || new Error('IndexedDB put failed'));
            tx.onabort = () => reject(tx.error || new Error('IndexedDB put aborted'));
        } catch (e) {
            reject(e);
        }
    });
}

export async function setup_idb_get(dbName, storeName, key) {
    const db = await __setup_open_db(dbName, storeName);
    return await new Promise((resolve, reject) => {
        try {
            const tx = db.transaction([storeName], 'readonly');
            const req = tx.objectStore(storeName).get(key);
            req.onsuccess = () => resolve(req.result ?? null);
            req.onerror = () => reject(req.error || new Error('IndexedDB get failed'));
        } catch (e) {
            reject(e);
        }
    });
}

export async function setup_idb_clear(dbName, storeName) {
    const db = await __setup_open_db(dbName, storeName);
    return await new Promise((resolve, reject) => {
        try {
            const tx = db.transaction([storeName], 'readwrite');
            tx.objectStore(storeName).clear();
            tx.oncomplete = () => resolve(true);
            tx.onerror = () => reject(tx.error || new Error('IndexedDB clear failed'));
            tx.onabort = () => reject(tx.error || new Error('IndexedDB clear aborted'));
        } catch (e) {
            reject(e);
        }
    });
}
")]
    extern "C" {
        fn setup_idb_supported() -> bool;

        #[wasm_bindgen(catch)]
        fn setup_idb_put(
            db: &str,
            store: &str,
            key: &str,
            text: &str,
        ) -> Result<js_sys::Promise, JsValue>;

        #[wasm_bindgen(catch)]
        fn setup_idb_get(db: &str, store: &str, key: &str) -> Result<js_sys::Promise, JsValue>;

        #[wasm_bindgen(catch)]
        fn setup_idb_clear(db: &str, store: &str) -> Result<js_sys::Promise, JsValue>;
    }

    fn js_err(op: &str, e: JsValue) -> StorageError {
        StorageError::Io(format!("IndexedDB {op} failed: {:?}", e))
    }

    /// IndexedDB object store; values are kept as JSON text.
    #[derive(Debug, Clone)]
    pub struct IndexedDbStore {
        database: String,
        store: String,
    }

    impl IndexedDbStore {
        pub fn new(keys: &StorageKeys) -> Result<Self, StorageError> {
            if !setup_idb_supported() {
                return Err(StorageError::Unavailable);
            }
            Ok(Self {
                database: keys.database.clone(),
                store: keys.object_store.clone(),
            })
        }
    }

    #[async_trait(?Send)]
    impl ObjectStore for IndexedDbStore {
        fn is_supported(&self) -> bool {
            true
        }

        async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            let promise =
                setup_idb_get(&self.database, &self.store, key).map_err(|e| js_err("get", e))?;
            let v = JsFuture::from(promise)
                .await
                .map_err(|e| js_err("get", e))?;
            let Some(text) = v.as_string() else {
                return Ok(None);
            };
            serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| StorageError::Corrupt(e.to_string()))
        }

        async fn set(&self, key: &str, value: Value) -> Result<Option<Value>, StorageError> {
            let text = serde_json::to_string(&value)?;
            let promise = setup_idb_put(&self.database, &self.store, key, &text)
                .map_err(|e| js_err("put", e))?;
            JsFuture::from(promise)
                .await
                .map_err(|e| js_err("put", e))?;
            Ok(Some(value))
        }

        async fn clear(&self) -> Result<(), StorageError> {
            let promise =
                setup_idb_clear(&self.database, &self.store).map_err(|e| js_err("clear", e))?;
            JsFuture::from(promise)
                .await
                .map_err(|e| js_err("clear", e))?;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::{IndexedDbStore, LocalStorageBackend};

#[cfg(not(target_arch = "wasm32"))]
mod native_stubs {
    use async_trait::async_trait;
    use serde_json::Value;

    use crate::kv::KeyValueBackend;
    use crate::object_store::ObjectStore;
    use crate::{StorageError, StorageKeys};

    #[derive(Debug)]
    pub struct LocalStorageBackend;

    impl LocalStorageBackend {
        pub fn new() -> Result<Self, StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    impl KeyValueBackend for LocalStorageBackend {
        fn get_raw(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }

        fn set_raw(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }

        fn clear(&mut self) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[derive(Debug, Clone)]
    pub struct IndexedDbStore;

    impl IndexedDbStore {
        pub fn new(_keys: &StorageKeys) -> Result<Self, StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[async_trait(?Send)]
    impl ObjectStore for IndexedDbStore {
        fn is_supported(&self) -> bool {
            false
        }

        async fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
            Err(StorageError::Unavailable)
        }

        async fn set(&self, _key: &str, _value: Value) -> Result<Option<Value>, StorageError> {
            Err(StorageError::Unavailable)
        }

        async fn clear(&self) -> Result<(), StorageError> {
            Err(StorageError::Unavailable)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn browser_tiers_are_unavailable_natively() {
            assert!(matches!(
                LocalStorageBackend::new(),
                Err(StorageError::Unavailable)
            ));
            assert!(IndexedDbStore::new(&StorageKeys::default()).is_err());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_stubs::{IndexedDbStore, LocalStorageBackend};
