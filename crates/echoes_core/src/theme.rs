//! The persisted light/dark theme preference.

use crate::domain::ThemePreference;
use crate::kv::{keys, write_raw};
use crate::ports::KeyValueStore;
use std::sync::Arc;

pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
}

impl ThemeStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Missing or unrecognised values fall back to following the system.
    pub fn theme(&self) -> ThemePreference {
        self.store
            .get(keys::THEME)
            .and_then(|raw| ThemePreference::parse(&raw))
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: ThemePreference) {
        write_raw(self.store.as_ref(), keys::THEME, theme.as_str());
    }
}
