//! `localStorage` backend for the profile store

use attestation_core::{AttestationError, KeyValueStore};
use wasm_bindgen::JsValue;
use web_sys::Storage;

fn storage_error(e: JsValue) -> AttestationError {
    AttestationError::Storage(
        e.as_string()
            .unwrap_or_else(|| format!("localStorage failure: {:?}", e)),
    )
}

/// Profile entries kept in the page origin's `localStorage`
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open the current window's `localStorage`
    pub fn open() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let storage = window.local_storage()?.ok_or("No localStorage")?;
        Ok(Self::new(storage))
    }
}

impl KeyValueStore for LocalStorageStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AttestationError> {
        self.storage.set_item(key, value).map_err(storage_error)
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, AttestationError> {
        self.storage.get_item(key).map_err(storage_error)
    }

    fn keys(&self) -> Result<Vec<String>, AttestationError> {
        let len = self.storage.length().map_err(storage_error)?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = self.storage.key(i).map_err(storage_error)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn clear(&mut self) -> Result<(), AttestationError> {
        self.storage.clear().map_err(storage_error)
    }
}
