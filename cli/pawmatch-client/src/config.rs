//! Configuration types for dog API client construction.

use std::collections::BTreeMap;
use std::time::Duration;

pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for [`crate::DogClient`] construction.
#[derive(Debug, Clone, Default)]
pub struct DogClientConfig {
    /// Base URL for the dog adoption API.
    pub base_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl DogClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Join an endpoint path onto the base URL.
    ///
    /// The base URL may or may not carry a trailing slash.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
