//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] =
    ["http://localhost:5173", "https://echoes-journal.app"];

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Server-held upstream key. Never logged.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub allowed_origins: Vec<String>,
    pub data_path: PathBuf,
    pub upstream_timeout: Duration,
}

// Hand-written so the key stays out of debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("log_level", &self.log_level)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("allowed_origins", &self.allowed_origins)
            .field("data_path", &self.data_path)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let var = |name: &str| vars.get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // --- Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Upstream Settings ---
        let gemini_api_key = var("GEMINI_API_KEY");
        let gemini_base_url = var("GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !gemini_base_url.starts_with("http://") && !gemini_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "GEMINI_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", gemini_base_url),
            ));
        }

        let upstream_timeout = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "UPSTREAM_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", raw),
                    )
                })?,
            None => Duration::from_secs(30),
        };

        // --- CORS and Storage ---
        let allowed_origins = match var("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let data_path = var("DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/echoes.json"));

        Ok(Self {
            bind_address,
            log_level,
            gemini_api_key,
            gemini_base_url,
            allowed_origins,
            data_path,
            upstream_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_vars(HashMap::new()).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.allowed_origins.len(), 2);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
    }

    #[test]
    fn parses_overrides() {
        let config = Config::from_vars(vars(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("RUST_LOG", "debug"),
            ("GEMINI_API_KEY", "server-secret"),
            ("GEMINI_BASE_URL", "http://localhost:9999/"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example/"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.gemini_api_key.as_deref(), Some("server-secret"));
        assert_eq!(config.gemini_base_url, "http://localhost:9999");
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            Config::from_vars(vars(&[("BIND_ADDRESS", "nowhere")])),
            Err(ConfigError::InvalidValue(name, _)) if name == "BIND_ADDRESS"
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("UPSTREAM_TIMEOUT_SECS", "0")])),
            Err(ConfigError::InvalidValue(name, _)) if name == "UPSTREAM_TIMEOUT_SECS"
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("GEMINI_BASE_URL", "ftp://x")])),
            Err(ConfigError::InvalidValue(name, _)) if name == "GEMINI_BASE_URL"
        ));
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = Config::from_vars(vars(&[("GEMINI_API_KEY", "server-secret")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("server-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
