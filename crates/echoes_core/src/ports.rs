//! crates/echoes_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of concrete storage back-ends and HTTP clients.

use async_trait::async_trait;
use serde_json::Value;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port
//=========================================================================================

/// Synchronous string-to-string persistence shared by all stores.
///
/// Each store owns its own keys; writes are last-write-wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Implementations must keep serving the new value from memory even when
    /// the durable write fails, and report that failure as `PortError::Storage`.
    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;
}

//=========================================================================================
// Network Ports
//=========================================================================================

/// What the upstream provider said about a candidate key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Accepted,
    Rejected { status: u16, message: Option<String> },
    Unreachable(String),
}

#[async_trait]
pub trait ApiKeyVerifier: Send + Sync {
    /// Lists models with the candidate key and reports how the provider answered.
    async fn probe(&self, api_key: &str) -> ProbeOutcome;
}

#[async_trait]
pub trait GenerativeAiService: Send + Sync {
    /// Sends `body` to the provider method named by `endpoint`
    /// (e.g. `models/gemini-2.0-flash:generateContent`) and returns its JSON reply.
    async fn generate(&self, endpoint: &str, body: Value) -> PortResult<Value>;
}
