//! Runtime configuration for the posts screen.
//!
//! # Responsibility
//! - Resolve endpoint, store location and request timeout.
//! - Read overrides from `POSTFEED_*` environment variables.
//!
//! # Invariants
//! - Blank environment values fall back to defaults.
//! - Malformed values are reported, never silently ignored.

use crate::fetch::DEFAULT_POSTS_ENDPOINT;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENDPOINT_ENV: &str = "POSTFEED_ENDPOINT";
pub const DB_PATH_ENV: &str = "POSTFEED_DB_PATH";
pub const TIMEOUT_MS_ENV: &str = "POSTFEED_TIMEOUT_MS";

const DEFAULT_DB_FILE_NAME: &str = "postfeed.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTimeout { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeout { var, value } => write!(
                f,
                "`{var}` must be a positive number of milliseconds, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostfeedConfig {
    pub endpoint: String,
    pub store_path: PathBuf,
    /// `None` keeps the HTTP client's default behavior.
    pub request_timeout: Option<Duration>,
}

impl Default for PostfeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_POSTS_ENDPOINT.to_string(),
            store_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            request_timeout: None,
        }
    }
}

impl PostfeedConfig {
    /// Builds configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let non_blank = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(endpoint) = non_blank(ENDPOINT_ENV) {
            config.endpoint = endpoint;
        }
        if let Some(path) = non_blank(DB_PATH_ENV) {
            config.store_path = PathBuf::from(path);
        }
        if let Some(raw) = non_blank(TIMEOUT_MS_ENV) {
            config.request_timeout = Some(parse_timeout_ms(TIMEOUT_MS_ENV, &raw)?);
        }

        Ok(config)
    }
}

/// Parses a positive millisecond count.
pub fn parse_timeout_ms(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout {
            var,
            value: raw.to_string(),
        }),
    }
}
