//! Settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::IndexingError;
use site_search_repository::algolia::DEFAULT_TIMEOUT;
use site_search_repository::{AlgoliaConfig, SearchIndexServiceConfig};
use site_search_shared::mapper::DEFAULT_FIELD;
use site_search_shared::DocumentMapper;

/// Default number of records per batch request during a rebuild.
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Switches that decide which sync entry points are installed.
///
/// Read once at startup and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Mirror page lifecycle events into the index.
    pub auto_index: bool,
    /// Offer the manual reindex widget.
    pub widget: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_index: true,
            widget: true,
        }
    }
}

/// Everything the sync layer needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    pub algolia: AlgoliaConfig,
    /// Content fields copied into each record.
    pub fields: Vec<String>,
    /// Templates whose pages are indexed; empty means all.
    pub templates: Vec<String>,
    pub sync: SyncConfig,
    pub batch_size: usize,
    /// JSON export of the site tree used by the manual reindex.
    pub site_export_path: Option<PathBuf>,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ALGOLIA_APP_ID`: Application id (required)
    /// - `ALGOLIA_API_KEY`: API key with write access (required)
    /// - `ALGOLIA_INDEX`: Live index name (required)
    /// - `ALGOLIA_HOST`: Overrides the API host (default: derived from the app id)
    /// - `ALGOLIA_FIELDS`: Comma separated content fields (default: text)
    /// - `ALGOLIA_TEMPLATES`: Comma separated templates to index (default: all)
    /// - `ALGOLIA_AUTOINDEX`: Mirror page events into the index (default: true)
    /// - `ALGOLIA_WIDGET`: Offer the manual reindex widget (default: true)
    /// - `ALGOLIA_BATCH_SIZE`: Records per batch request (default: 1000)
    /// - `ALGOLIA_TIMEOUT_SECS`: Request timeout in seconds (default: 30)
    /// - `SITE_EXPORT_PATH`: JSON export of the site tree (default: none)
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - Validated settings
    /// * `Err(IndexingError::ConfigError)` - If a required value is missing or malformed
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the raw value of a variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| IndexingError::config(format!("{} is not set", key)))
        };

        let mut algolia = AlgoliaConfig::new(
            required("ALGOLIA_APP_ID")?,
            required("ALGOLIA_API_KEY")?,
            required("ALGOLIA_INDEX")?,
        );

        if let Some(host) = lookup("ALGOLIA_HOST").filter(|h| !h.trim().is_empty()) {
            let host = Url::parse(host.trim())
                .map_err(|e| IndexingError::config(format!("Invalid ALGOLIA_HOST: {}", e)))?;
            algolia = algolia.with_host(host);
        }

        let timeout = lookup("ALGOLIA_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        algolia = algolia.with_timeout(timeout);

        algolia.validate()?;

        let fields = lookup("ALGOLIA_FIELDS")
            .map(|s| split_list(&s))
            .filter(|fields| !fields.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_FIELD.to_string()]);
        let templates = lookup("ALGOLIA_TEMPLATES")
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let sync = SyncConfig {
            auto_index: flag(&lookup, "ALGOLIA_AUTOINDEX", true),
            widget: flag(&lookup, "ALGOLIA_WIDGET", true),
        };

        let batch_size = lookup("ALGOLIA_BATCH_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE);

        let site_export_path = lookup("SITE_EXPORT_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            algolia,
            fields,
            templates,
            sync,
            batch_size,
            site_export_path,
        })
    }

    /// The mapper for the configured fields and templates.
    pub fn mapper(&self) -> DocumentMapper {
        DocumentMapper::new(self.fields.clone(), self.templates.clone())
    }

    pub fn service_config(&self) -> SearchIndexServiceConfig {
        SearchIndexServiceConfig::with_max_batch_size(self.batch_size)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a boolean switch.
///
/// Valid values: "true", "1", "yes", "on" and their negations (case-insensitive).
/// Falls back to `default` if not set or invalid.
fn flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!(key = key, value = %raw, default = default, "Invalid boolean setting, using default");
            default
        }
    }
}
