pub mod api_key;
pub mod clock;
pub mod debounce;
pub mod domain;
pub mod drafts;
pub mod ids;
pub mod kv;
pub mod ports;
pub mod sessions;
pub mod theme;

pub use api_key::{ApiKeyManager, KeyFormatError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use debounce::Debouncer;
pub use domain::{
    ApiKeyTier, Draft, DraftInput, Insight, KeyValidation, Millis, SessionInput, SessionSummary,
    ThemePreference, UsageInfo,
};
pub use drafts::DraftStore;
pub use kv::MemoryStore;
pub use ports::{
    ApiKeyVerifier, GenerativeAiService, KeyValueStore, PortError, PortResult, ProbeOutcome,
};
pub use sessions::SessionLog;
pub use theme::ThemeStore;
