use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
///
/// The LLM, row-store and listening collaborators are optional: features
/// that need an absent credential report that instead of failing at load.
#[derive(Debug, Clone)]
pub struct Config {
    // Spreadsheet
    pub sheet_id: String,
    pub sheets_base_url: String,

    // Row store
    pub store_url: Option<String>,
    pub store_key: Option<String>,

    // LLM completion API
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,

    // Social-listening search API
    pub listening_base_url: String,
    pub listening_api_key: Option<String>,

    // Network
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            sheet_id: required_env("SHEET_ID")?,
            sheets_base_url: env_or_default("SHEETS_BASE_URL", "https://docs.google.com"),

            store_url: optional_env("STORE_URL").map(|u| u.trim_end_matches('/').to_string()),
            store_key: optional_env("STORE_KEY"),

            llm_base_url: env_or_default("LLM_BASE_URL", "https://api.anthropic.com"),
            llm_api_key: optional_env("LLM_API_KEY"),
            llm_model: env_or_default("LLM_MODEL", "claude-sonnet-4-20250514"),

            listening_base_url: env_or_default(
                "LISTENING_BASE_URL",
                "https://api.twitterapi.io",
            ),
            listening_api_key: optional_env("LISTENING_API_KEY"),

            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "SHEET_ID".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.store_url.is_some() != self.store_key.is_some() {
            return Err(ConfigError::InvalidValue {
                name: "STORE_URL/STORE_KEY".to_string(),
                message: "must be set together".to_string(),
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration for tests: everything points at placeholder endpoints.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            sheet_id: "test-sheet".to_string(),
            sheets_base_url: "http://127.0.0.1:0".to_string(),
            store_url: Some("http://127.0.0.1:0".to_string()),
            store_key: Some("test-key".to_string()),
            llm_base_url: "http://127.0.0.1:0".to_string(),
            llm_api_key: Some("test-key".to_string()),
            llm_model: "claude-sonnet-4-20250514".to_string(),
            listening_base_url: "http://127.0.0.1:0".to_string(),
            listening_api_key: Some("test-key".to_string()),
            http_timeout: Duration::from_secs(5),
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
