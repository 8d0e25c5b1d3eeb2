//! crates/echoes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! The serde representation doubles as the persisted format, so field names
//! are camelCase to stay compatible with existing stored entries.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

/// An in-progress journaling entry. Archived drafts share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// `draft_<timestamp>_<random>`, assigned at first save.
    pub id: String,
    pub category_id: String,
    pub category_title: String,
    #[serde(default)]
    pub text: String,
    /// Embedded drawing as a data URL.
    #[serde(default)]
    pub drawing: Option<String>,
    /// Voice-to-text content.
    #[serde(default)]
    pub transcription: Option<String>,
    pub created_at: Millis,
    pub updated_at: Millis,
}

impl Draft {
    /// True when the draft carries no text worth keeping.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The caller-supplied part of a draft save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput {
    pub category_id: String,
    pub category_title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub drawing: Option<String>,
    #[serde(default)]
    pub transcription: Option<String>,
}

/// Summary of a completed, AI-assisted journaling session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub timestamp: Millis,
    pub category_id: String,
    pub category_title: String,
    pub word_count: u32,
    pub had_audio: bool,
    pub had_image: bool,
}

/// The caller-supplied part of a session summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
    pub category_id: String,
    pub category_title: String,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub had_audio: bool,
    #[serde(default)]
    pub had_image: bool,
}

/// Derived from the session log, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub is_returning: bool,
    pub total_sessions: usize,
    pub last_category_id: String,
    pub last_category_title: String,
    pub last_session_at: Millis,
    /// e.g. "2d ago".
    pub time_since: String,
}

/// Usage class of a user-supplied API key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyTier {
    Free,
    Paid,
    #[default]
    Unknown,
}

impl ApiKeyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyTier::Free => "free",
            ApiKeyTier::Paid => "paid",
            ApiKeyTier::Unknown => "unknown",
        }
    }

    /// Parses a stored tier; anything unrecognised is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "free" => ApiKeyTier::Free,
            "paid" => ApiKeyTier::Paid,
            _ => ApiKeyTier::Unknown,
        }
    }
}

/// Result of checking a candidate API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KeyValidation {
    pub fn valid() -> Self {
        Self { is_valid: true, error: None }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

/// Display mapping for the current key tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageInfo {
    pub tier_label: String,
    pub tier_color: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Dark,
    Light,
    #[default]
    System,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Dark => "dark",
            ThemePreference::Light => "light",
            ThemePreference::System => "system",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "dark" => Some(ThemePreference::Dark),
            "light" => Some(ThemePreference::Light),
            "system" => Some(ThemePreference::System),
            _ => None,
        }
    }
}
