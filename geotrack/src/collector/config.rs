//! Collector connection settings.

use std::time::Duration;

/// Default collector base URL (a backend on the local machine).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default timeout for a single HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the collector lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Base URL without trailing slash.
    pub base_url: String,

    /// Per-request timeout (connect + response).
    pub timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl CollectorConfig {
    /// Create a config for the given base URL. Trailing slashes are dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
