//! crates/echoes_core/src/api_key.rs
//!
//! Stores, validates and clears the user-supplied model API key and its tier.
//! Reads are served from an in-memory cache that is loaded from storage once.
//! A stored key that fails the format check is never treated as usable.

use crate::domain::{ApiKeyTier, KeyValidation, UsageInfo};
use crate::kv::{keys, remove_entry, write_raw};
use crate::ports::{ApiKeyVerifier, KeyValueStore, ProbeOutcome};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Keys shorter than this are rejected without a network round-trip.
pub const MIN_KEY_LEN: usize = 20;

/// Every Gemini API key starts with this.
pub const KEY_PREFIX: &str = "AIza";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyFormatError {
    #[error("API key cannot be empty")]
    Empty,
    #[error("Invalid API key format")]
    Malformed,
}

/// Local format check applied before a key is stored or sent anywhere.
pub fn check_key_format(key: &str) -> Result<(), KeyFormatError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(KeyFormatError::Empty);
    }
    if key.chars().count() < MIN_KEY_LEN || !key.starts_with(KEY_PREFIX) {
        return Err(KeyFormatError::Malformed);
    }
    Ok(())
}

pub fn is_well_formed(key: &str) -> bool {
    check_key_format(key).is_ok()
}

#[derive(Debug, Clone, Default)]
struct CachedKey {
    loaded: bool,
    key: Option<String>,
    tier: ApiKeyTier,
}

pub struct ApiKeyManager {
    store: Arc<dyn KeyValueStore>,
    verifier: Arc<dyn ApiKeyVerifier>,
    cache: RwLock<CachedKey>,
}

impl ApiKeyManager {
    pub fn new(store: Arc<dyn KeyValueStore>, verifier: Arc<dyn ApiKeyVerifier>) -> Self {
        Self {
            store,
            verifier,
            cache: RwLock::new(CachedKey::default()),
        }
    }

    /// Stores a well-formed key and its tier. Malformed keys leave the stored values untouched.
    pub fn save_api_key(&self, key: &str, tier: ApiKeyTier) -> Result<(), KeyFormatError> {
        check_key_format(key)?;
        let key = key.trim();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        write_raw(self.store.as_ref(), keys::API_KEY, key);
        write_raw(self.store.as_ref(), keys::API_TIER, tier.as_str());
        *cache = CachedKey {
            loaded: true,
            key: Some(key.to_string()),
            tier,
        };
        info!(tier = tier.as_str(), "Saved API key");
        Ok(())
    }

    pub fn api_key(&self) -> Option<String> {
        self.cached().key
    }

    pub fn api_key_tier(&self) -> ApiKeyTier {
        self.cached().tier
    }

    pub fn clear_api_key(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        remove_entry(self.store.as_ref(), keys::API_KEY);
        remove_entry(self.store.as_ref(), keys::API_TIER);
        *cache = CachedKey {
            loaded: true,
            ..CachedKey::default()
        };
        info!("Cleared API key");
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// Checks a candidate key locally, then against the provider.
    /// Every failure is reported in the returned value.
    pub async fn validate_api_key(&self, key: &str) -> KeyValidation {
        if let Err(err) = check_key_format(key) {
            return KeyValidation::invalid(err.to_string());
        }
        let key = key.trim();
        match self.verifier.probe(key).await {
            ProbeOutcome::Accepted => KeyValidation::valid(),
            ProbeOutcome::Rejected { status, message } => {
                warn!(status, "Provider rejected API key");
                KeyValidation::invalid(
                    message.unwrap_or_else(|| format!("API key rejected (HTTP {status})")),
                )
            }
            ProbeOutcome::Unreachable(detail) => {
                warn!(error = %detail, "API key validation could not reach provider");
                KeyValidation::invalid(format!("Network error: {detail}"))
            }
        }
    }

    pub fn usage_info(&self) -> UsageInfo {
        let (label, color) = match self.api_key_tier() {
            ApiKeyTier::Free => ("Free Tier", "amber"),
            ApiKeyTier::Paid => ("Paid Tier", "emerald"),
            ApiKeyTier::Unknown => ("Unknown Tier", "slate"),
        };
        UsageInfo {
            tier_label: label.to_string(),
            tier_color: color.to_string(),
        }
    }

    fn cached(&self) -> CachedKey {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if cache.loaded {
                return cache.clone();
            }
        }
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.loaded {
            return cache.clone();
        }
        let key = self
            .store
            .get(keys::API_KEY)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let key = match key {
            Some(k) if !is_well_formed(&k) => {
                warn!("Ignoring stored API key with an invalid format");
                None
            }
            other => other,
        };
        let tier = self
            .store
            .get(keys::API_TIER)
            .map(|t| ApiKeyTier::parse(&t))
            .unwrap_or_default();
        *cache = CachedKey {
            loaded: true,
            key,
            tier,
        };
        cache.clone()
    }
}
