//! Configuration for the topic backend client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{TopicError, TopicResult};

/// Environment variable for the backend base URL.
pub const API_URL_ENV: &str = "TOPIC_SYNC_API_URL";
/// Environment variable for the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "TOPIC_SYNC_TIMEOUT_SECS";
/// Environment variable for the default page size of `load_topics`.
pub const PAGE_SIZE_ENV: &str = "TOPIC_SYNC_PAGE_SIZE";

/// Default backend base URL.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
/// Default collection path under the base URL.
const DEFAULT_TOPICS_PATH: &str = "study-topics";
/// Default page size for listing topics.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Configuration for the remote topic gateway and the store built on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL.
    pub base_url: String,
    /// Collection path appended to `base_url`.
    pub topics_path: String,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Page size used by `TopicStore::load_topics`.
    pub default_page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            topics_path: DEFAULT_TOPICS_PATH.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the `TOPIC_SYNC_*` environment variables.
    ///
    /// Unset or unparsable values fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup(TIMEOUT_ENV).and_then(|s| s.trim().parse::<u64>().ok()) {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(size) = lookup(PAGE_SIZE_ENV).and_then(|s| s.trim().parse::<u32>().ok()) {
            config.default_page_size = size;
        }
        config
    }

    /// Set the backend base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the collection path.
    #[must_use]
    pub fn with_topics_path(mut self, path: impl Into<String>) -> Self {
        self.topics_path = path.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the default page size.
    #[must_use]
    pub const fn with_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> TopicResult<()> {
        if self.default_page_size == 0 {
            return Err(TopicError::Config(
                "default_page_size must be > 0".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(TopicError::Config(
                "request_timeout must be > 0".to_string(),
            ));
        }
        self.collection_url().map(|_| ())
    }

    /// Absolute URL of the topic collection.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn collection_url(&self) -> TopicResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TopicError::Config(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| TopicError::Config("base_url cannot be a base".to_string()))?;
            segments.pop_if_empty();
            segments.extend(self.topics_path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new()
            .with_base_url("https://api.example.org/v1/")
            .with_timeout(Duration::from_secs(5))
            .with_page_size(20);

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.default_page_size, 20);
        assert_eq!(
            config.collection_url().map(String::from),
            Ok("https://api.example.org/v1/study-topics".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_page = ClientConfig::new().with_page_size(0);
        assert!(matches!(zero_page.validate(), Err(TopicError::Config(_))));

        let bad_url = ClientConfig::new().with_base_url("not a url");
        assert!(matches!(bad_url.validate(), Err(TopicError::Config(_))));

        let ftp = ClientConfig::new().with_base_url("ftp://example.org");
        assert!(matches!(ftp.validate(), Err(TopicError::Config(_))));
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(|key| match key {
            API_URL_ENV => Some(" http://10.0.0.2:9000 ".to_string()),
            TIMEOUT_ENV => Some("12".to_string()),
            PAGE_SIZE_ENV => Some("oops".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_serde_uses_seconds() {
        let json = serde_json::to_value(ClientConfig::default()).unwrap_or_default();
        assert_eq!(json["request_timeout"], 30);
        assert_eq!(json["connect_timeout"], 10);
    }
}
