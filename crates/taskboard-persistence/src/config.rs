//! Backend client configuration.
//!
//! # Environment Variables
//!
//! - `TASKBOARD_API_URL`: Base URL of the hosted store (required)
//! - `TASKBOARD_API_KEY`: Project API key (required)
//! - `TASKBOARD_REQUEST_TIMEOUT_MS`: Per-request timeout in milliseconds

use std::time::Duration;

use crate::error::{PersistenceError, Result};

/// Environment variable for the backend base URL.
pub const API_URL_ENV: &str = "TASKBOARD_API_URL";

/// Environment variable for the backend API key.
pub const API_KEY_ENV: &str = "TASKBOARD_API_KEY";

/// Environment variable for the request timeout.
pub const REQUEST_TIMEOUT_ENV: &str = "TASKBOARD_REQUEST_TIMEOUT_MS";

/// Default table holding task rows.
const DEFAULT_TABLE: &str = "tasks";

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`RestBackend`](crate::RestBackend).
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://abc.example.co`.
    pub base_url: String,
    /// API key sent as both `apikey` and bearer token.
    pub api_key: String,
    /// Table holding task rows.
    pub table: String,
    /// Upper bound for a single request.
    pub request_timeout: Duration,
}

impl BackendConfig {
    /// Creates a config for the given endpoint and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Loads the config from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    PersistenceError::Configuration(format!(
                        "Missing {} environment variable",
                        key
                    ))
                })
        };

        let mut config = Self::new(require(API_URL_ENV)?, require(API_KEY_ENV)?);

        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                PersistenceError::Configuration(format!(
                    "{} must be a number of milliseconds, got {:?}",
                    REQUEST_TIMEOUT_ENV, raw
                ))
            })?;
            config.request_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Sets the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            table: DEFAULT_TABLE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
