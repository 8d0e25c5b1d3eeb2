//! services/api/src/adapters/file_store.rs
//!
//! A `KeyValueStore` that keeps every entry in memory and mirrors the whole
//! map to a single JSON file after each mutation.

use echoes_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file starts empty; an unreadable
    /// or corrupt one is logged and also starts empty, to be overwritten on
    /// the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => {
                    info!(path = %path.display(), entries = entries.len(), "Loaded journal data");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Journal data file is corrupt; starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Journal data file is unreadable; starting empty");
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the map to a sibling temp file and renames it into place.
    fn flush(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        let storage = |e: std::io::Error| PortError::Storage(format!("{}: {}", self.path.display(), e));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(storage)?;
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(storage)?;
        fs::rename(&tmp, &self.path).map_err(storage)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("echoes.json");

        let store = FileStore::open(&path);
        store.set("echoes_theme", "dark").unwrap();
        store.set("echoes_sessions", "[]").unwrap();
        store.remove("echoes_sessions").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("echoes_theme").as_deref(), Some("dark"));
        assert_eq!(reopened.get("echoes_sessions"), None);
    }

    #[test]
    fn corrupt_file_starts_empty_and_is_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("echoes.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get("echoes_theme"), None);
        store.set("echoes_theme", "light").unwrap();
        assert_eq!(FileStore::open(&path).get("echoes_theme").as_deref(), Some("light"));
    }

    #[test]
    fn failed_flush_keeps_value_in_memory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a regular file").unwrap();
        // The parent "directory" is a file, so every flush fails.
        let store = FileStore::open(blocker.join("echoes.json"));

        let result = store.set("echoes_theme", "dark");
        assert!(matches!(result, Err(PortError::Storage(_))));
        assert_eq!(store.get("echoes_theme").as_deref(), Some("dark"));
    }
}
