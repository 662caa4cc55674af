//! Client configuration: endpoint, timeout and preference store location.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Result, SearchError};

/// Default search endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/smart_search";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Environment variable overriding the endpoint.
pub const ENV_ENDPOINT: &str = "SMART_SEARCH_API_URL";
/// Environment variable overriding the timeout (milliseconds).
pub const ENV_TIMEOUT_MS: &str = "SMART_SEARCH_TIMEOUT_MS";
/// Environment variable overriding the preference file path.
pub const ENV_STORE: &str = "SMART_SEARCH_STORE";

/// Configuration for the search client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Full URL the search request is posted to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Preference file location.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_store_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("smart-search"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("preferences.json")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
            store_path: default_store_path(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `SMART_SEARCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`. Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(timeout) = get(ENV_TIMEOUT_MS) {
            config.timeout_ms = timeout.trim().parse().map_err(|_| {
                SearchError::Config(format!("{} must be a number, got '{}'", ENV_TIMEOUT_MS, timeout))
            })?;
        }
        if let Some(store) = get(ENV_STORE) {
            config.store_path = PathBuf::from(store);
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the timeout in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the preference file location.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed endpoint URL.
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(SearchError::Config(format!(
                "unsupported endpoint scheme '{}'",
                scheme
            ))),
        }
    }

    /// Checks the endpoint and timeout.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.timeout_ms == 0 {
            return Err(SearchError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}
