/// Key-value storage access for chrome.storage.sync / chrome.storage.local

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::config::{EXPORT_PREVIEW_KEY, FOLDERS_KEY, QUERIES_KEY};
use crate::errors::StorageError;
use crate::library::QueryLibrary;
use crate::query_data::{Folder, SavedQuery};

/// Rejection value the bridge uses for a read that hit its timeout
const TIMEOUT_REJECTION: &str = "timeout";

// Import JS bridge functions
#[wasm_bindgen(module = "/js/bridge.js")]
extern "C" {
    fn storageAvailable(area: &str) -> bool;

    #[wasm_bindgen(catch)]
    async fn storageGet(area: &str, key: &str, timeout_ms: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSet(area: &str, key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSetMany(area: &str, items: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageRemove(area: &str, key: &str) -> Result<(), JsValue>;
}

/// Async JSON get/set/remove over one storage namespace
#[allow(async_fn_in_trait)]
pub trait StorageArea {
    async fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set_value(&self, key: &str, value: &Value) -> Result<(), StorageError>;
    /// Write several keys in one call; either all land or none do
    async fn set_values(&self, values: &[(&str, Value)]) -> Result<(), StorageError>;
    async fn remove_value(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    /// Synced across the user's browsers
    Sync,
    /// This device only
    Local,
}

impl AreaKind {
    fn as_str(&self) -> &'static str {
        match self {
            AreaKind::Sync => "sync",
            AreaKind::Local => "local",
        }
    }
}

/// The extension's own storage, reached through the JS bridge
#[derive(Debug, Clone, PartialEq)]
pub struct ChromeStorage {
    area: AreaKind,
    /// 0 disables the timeout
    read_timeout_ms: i32,
}

impl ChromeStorage {
    pub fn sync() -> Self {
        ChromeStorage {
            area: AreaKind::Sync,
            read_timeout_ms: 0,
        }
    }

    pub fn local() -> Self {
        ChromeStorage {
            area: AreaKind::Local,
            read_timeout_ms: 0,
        }
    }

    /// Fail reads with `StorageError::TimedOut` after `timeout_ms`
    pub fn with_read_timeout(mut self, timeout_ms: i32) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if storageAvailable(self.area.as_str()) {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }
}

/// Plain objects, not JS Maps, so chrome.storage can persist them
fn to_storage_js(value: &Value) -> Result<JsValue, StorageError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| StorageError::Serialization(format!("{:?}", e)))
}

fn bridge_error(err: JsValue) -> StorageError {
    match err.as_string() {
        Some(msg) if msg == TIMEOUT_REJECTION => StorageError::TimedOut,
        Some(msg) => StorageError::Bridge(msg),
        None => StorageError::Bridge(format!("{:?}", err)),
    }
}

impl StorageArea for ChromeStorage {
    async fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.ensure_available()?;

        let value_js = storageGet(self.area.as_str(), key, self.read_timeout_ms)
            .await
            .map_err(bridge_error)?;

        if value_js.is_null() || value_js.is_undefined() {
            return Ok(None);
        }

        serde_wasm_bindgen::from_value(value_js)
            .map(Some)
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))
    }

    async fn set_value(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.ensure_available()?;

        storageSet(self.area.as_str(), key, to_storage_js(value)?)
            .await
            .map_err(bridge_error)
    }

    async fn set_values(&self, values: &[(&str, Value)]) -> Result<(), StorageError> {
        self.ensure_available()?;

        let items: serde_json::Map<String, Value> = values
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();

        storageSetMany(self.area.as_str(), to_storage_js(&Value::Object(items))?)
            .await
            .map_err(bridge_error)
    }

    async fn remove_value(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_available()?;

        storageRemove(self.area.as_str(), key)
            .await
            .map_err(bridge_error)
    }
}

/// Process-local storage for tests and pages without extension APIs
///
/// Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Rc<RefCell<HashMap<String, Value>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl StorageArea for MemoryStorage {
    async fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    async fn set_value(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.values.borrow_mut().insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn set_values(&self, values: &[(&str, Value)]) -> Result<(), StorageError> {
        let mut stored = self.values.borrow_mut();
        for (key, value) in values {
            stored.insert(key.to_string(), value.clone());
        }
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> Result<(), StorageError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read a stored list; anything but an array reads as empty and malformed
/// records are skipped
async fn load_list<S: StorageArea, T: DeserializeOwned>(storage: &S, key: &str) -> Result<Vec<T>, StorageError> {
    let items = match storage.get_value(key).await? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed record under '{}': {}", key, e);
                None
            }
        })
        .collect())
}

fn list_value<T: Serialize>(items: &[T]) -> Result<Value, StorageError> {
    serde_json::to_value(items).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub async fn load_queries<S: StorageArea>(storage: &S) -> Result<Vec<SavedQuery>, StorageError> {
    load_list(storage, QUERIES_KEY).await
}

pub async fn load_folders<S: StorageArea>(storage: &S) -> Result<Vec<Folder>, StorageError> {
    load_list(storage, FOLDERS_KEY).await
}

pub async fn load_library<S: StorageArea>(storage: &S) -> Result<QueryLibrary, StorageError> {
    let queries = load_queries(storage).await?;
    let folders = load_folders(storage).await?;
    Ok(QueryLibrary::from_parts(queries, folders))
}

/// Persist both collections in a single write
pub async fn save_library<S: StorageArea>(storage: &S, library: &QueryLibrary) -> Result<(), StorageError> {
    let values = [
        (FOLDERS_KEY, list_value(&library.folders)?),
        (QUERIES_KEY, list_value(&library.queries)?),
    ];
    storage.set_values(&values).await
}

/// Hand an export payload to the preview page
pub async fn stash_export_preview<S: StorageArea>(storage: &S, json: &str) -> Result<(), StorageError> {
    storage
        .set_value(EXPORT_PREVIEW_KEY, &Value::String(json.to_string()))
        .await
}

/// Read the pending export payload once, clearing it
pub async fn take_export_preview<S: StorageArea>(storage: &S) -> Result<Option<String>, StorageError> {
    let preview = match storage.get_value(EXPORT_PREVIEW_KEY).await? {
        Some(Value::String(json)) => Some(json),
        Some(Value::Null) | None => None,
        Some(other) => Some(
            serde_json::to_string_pretty(&other).map_err(|e| StorageError::Serialization(e.to_string()))?,
        ),
    };

    storage.remove_value(EXPORT_PREVIEW_KEY).await?;
    Ok(preview)
}
