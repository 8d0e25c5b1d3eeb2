//! crates/echoes_core/src/kv.rs
//!
//! Storage keys, the in-memory `KeyValueStore`, and the JSON helpers every
//! store uses to read and write its entries.

use crate::ports::{KeyValueStore, PortResult};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::warn;

/// Keys of the persisted entries.
pub mod keys {
    pub const CURRENT_DRAFT: &str = "echoes_current_draft";
    pub const DRAFTS: &str = "echoes_drafts";
    pub const SESSIONS: &str = "echoes_sessions";
    pub const API_KEY: &str = "echoes_gemini_api_key";
    pub const API_TIER: &str = "echoes_gemini_api_tier";
    pub const THEME: &str = "echoes_theme";
}

/// A volatile store, used in tests and as the fallback when no data path is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

//=========================================================================================
// JSON entry helpers
//=========================================================================================

/// Reads and decodes an entry. Missing and corrupt entries both read as `None`.
pub(crate) fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable stored entry");
            None
        }
    }
}

/// Encodes and writes an entry; failures are logged, never propagated.
pub(crate) fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => write_raw(store, key, &raw),
        Err(e) => warn!(key, error = %e, "Failed to encode entry"),
    }
}

pub(crate) fn write_raw(store: &dyn KeyValueStore, key: &str, raw: &str) {
    if let Err(e) = store.set(key, raw) {
        warn!(key, error = %e, "Write not persisted; keeping in-memory state");
    }
}

pub(crate) fn remove_entry(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        warn!(key, error = %e, "Removal not persisted; keeping in-memory state");
    }
}
