//! Connection settings for the hosted search API.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::errors::SearchIndexError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials and endpoints for the hosted search API.
#[derive(Clone)]
pub struct AlgoliaConfig {
    /// Application id, also used to derive the default hosts.
    pub app_id: String,
    /// API key with write access to the index.
    pub api_key: String,
    /// Name of the live index.
    pub index: String,
    /// Overrides both the read and the write host (proxies, local test servers).
    pub host: Option<Url>,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl fmt::Debug for AlgoliaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgoliaConfig")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .field("index", &self.index)
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AlgoliaConfig {
    /// Create a configuration with the default hosts and timeout.
    ///
    /// # Arguments
    ///
    /// * `app_id` - Application id
    /// * `api_key` - API key with write access
    /// * `index` - Live index name
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        index: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            index: index.into(),
            host: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_host(mut self, host: Url) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that every required value is present.
    ///
    /// Indexing cannot work without credentials and an index name, so this is
    /// checked once at startup and treated as fatal.
    pub fn validate(&self) -> Result<(), SearchIndexError> {
        for (name, value) in [
            ("app_id", &self.app_id),
            ("api_key", &self.api_key),
            ("index", &self.index),
        ] {
            if value.trim().is_empty() {
                return Err(SearchIndexError::configuration(format!(
                    "{} is required",
                    name
                )));
            }
        }

        if !self
            .app_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(SearchIndexError::configuration(format!(
                "app_id '{}' contains invalid characters",
                self.app_id
            )));
        }

        if let Some(host) = &self.host {
            if host.cannot_be_a_base() {
                return Err(SearchIndexError::configuration(format!(
                    "host '{}' cannot be used as a base URL",
                    host
                )));
            }
        }

        Ok(())
    }

    /// Host used for indexing operations.
    pub fn write_host(&self) -> Result<Url, SearchIndexError> {
        match &self.host {
            Some(host) => Ok(host.clone()),
            None => parse_host(&format!("https://{}.algolia.net", self.app_id)),
        }
    }

    /// Host used for search and listing operations.
    pub fn read_host(&self) -> Result<Url, SearchIndexError> {
        match &self.host {
            Some(host) => Ok(host.clone()),
            None => parse_host(&format!("https://{}-dsn.algolia.net", self.app_id)),
        }
    }
}

fn parse_host(raw: &str) -> Result<Url, SearchIndexError> {
    Url::parse(raw).map_err(|e| SearchIndexError::configuration(format!("{}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hosts() {
        let config = AlgoliaConfig::new("APP123", "key", "pages");
        assert_eq!(
            config.write_host().unwrap().as_str(),
            "https://app123.algolia.net/"
        );
        assert_eq!(
            config.read_host().unwrap().as_str(),
            "https://app123-dsn.algolia.net/"
        );
    }

    #[test]
    fn test_host_override() {
        let host = Url::parse("http://127.0.0.1:7700").unwrap();
        let config = AlgoliaConfig::new("APP", "key", "pages").with_host(host.clone());
        assert_eq!(config.write_host().unwrap(), host);
        assert_eq!(config.read_host().unwrap(), host);
    }

    #[test]
    fn test_validate() {
        assert!(AlgoliaConfig::new("APP", "key", "pages").validate().is_ok());

        for config in [
            AlgoliaConfig::new("", "key", "pages"),
            AlgoliaConfig::new("APP", " ", "pages"),
            AlgoliaConfig::new("APP", "key", ""),
            AlgoliaConfig::new("APP/../x", "key", "pages"),
        ] {
            assert!(matches!(
                config.validate(),
                Err(SearchIndexError::ConfigurationError(_))
            ));
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = AlgoliaConfig::new("APP", "super-secret", "pages");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
