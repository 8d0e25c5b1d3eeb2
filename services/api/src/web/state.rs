//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::gemini::GeminiHttp;
use crate::config::Config;
use echoes_core::clock::Clock;
use echoes_core::ports::{ApiKeyVerifier, KeyValueStore};
use echoes_core::{ApiKeyManager, DraftStore, SessionLog, ThemeStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Every store writes to the same key-value namespace; each owns its own keys.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub drafts: Arc<DraftStore>,
    pub sessions: Arc<SessionLog>,
    pub api_keys: Arc<ApiKeyManager>,
    pub themes: Arc<ThemeStore>,
    /// Upstream forwarder used by the proxy endpoint.
    pub upstream: Arc<GeminiHttp>,
}

impl AppState {
    /// Wires the stores over `store` and the upstream client from `config`.
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, reqwest::Error> {
        let upstream = Arc::new(GeminiHttp::new(
            config.gemini_base_url.clone(),
            config.upstream_timeout,
        )?);
        let verifier: Arc<dyn ApiKeyVerifier> = upstream.clone();
        Ok(Self {
            drafts: Arc::new(DraftStore::new(store.clone(), clock.clone())),
            sessions: Arc::new(SessionLog::new(store.clone(), clock)),
            api_keys: Arc::new(ApiKeyManager::new(store.clone(), verifier)),
            themes: Arc::new(ThemeStore::new(store)),
            upstream,
            config,
        })
    }
}
