use std::collections::BTreeMap;

use base64::Engine as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::StorageError;

/// Raw string store underneath [`KeyValueTier`].
pub trait KeyValueBackend {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removes every entry, not only the ones this tier wrote.
    fn clear(&mut self) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}

pub fn encode_key(key: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(key)
}

pub fn encode_value(value: &Value) -> Result<String, StorageError> {
    let json = serde_json::to_string(value)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

pub fn decode_value(raw: &str) -> Result<Value, StorageError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| StorageError::Corrupt(format!("base64: {e}")))?;
    let text =
        String::from_utf8(bytes).map_err(|e| StorageError::Corrupt(format!("utf-8: {e}")))?;
    serde_json::from_str(&text).map_err(|e| StorageError::Corrupt(format!("json: {e}")))
}

/// Synchronous tier: keys and JSON payloads are stored base64-encoded.
///
/// A payload that fails to decode is treated as total corruption: the whole
/// backend is wiped and the read reports absence.
#[derive(Debug, Default)]
pub struct KeyValueTier<B> {
    backend: B,
}

impl<B: KeyValueBackend> KeyValueTier<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn get_value(&mut self, key: &str) -> Option<Value> {
        let raw = match self.backend.get_raw(&encode_key(key)) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(err) => {
                tracing::warn!(key, %err, "key-value read failed");
                return None;
            }
        };

        match decode_value(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, %err, "key-value payload corrupt; clearing tier");
                if let Err(err) = self.backend.clear() {
                    tracing::warn!(%err, "failed to clear corrupt key-value tier");
                }
                None
            }
        }
    }

    /// Reads `key` as `T`. Shape mismatches are reported absent but kept.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(err) => {
                tracing::warn!(key, %err, "stored value has unexpected shape");
                None
            }
        }
    }

    /// Stores `value` and hands it back.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<T, StorageError> {
        let encoded = encode_value(&serde_json::to_value(&value)?)?;
        self.backend.set_raw(&encode_key(key), &encoded)?;
        Ok(value)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.backend.clear()
    }
}
