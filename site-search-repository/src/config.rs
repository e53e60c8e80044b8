//! Configuration types for the SearchIndexService.

/// Suffix of the scratch index a full rebuild writes into before it is
/// moved over the live index.
pub const DEFAULT_TEMP_INDEX_SUFFIX: &str = "_tmp";

/// Configuration for the SearchIndexService.
///
/// Controls how a full rebuild talks to the backend: how many records go into
/// one batch request and which scratch index is used.
#[derive(Debug, Clone)]
pub struct SearchIndexServiceConfig {
    /// Maximum number of records sent in a single batch request.
    ///
    /// Set to `None` to send every record in one request (not recommended for
    /// large sites). Defaults to 1000 if not specified.
    pub max_batch_size: Option<usize>,

    /// Suffix appended to the live index name to form the rebuild scratch index.
    pub temp_index_suffix: String,
}

impl Default for SearchIndexServiceConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
            temp_index_suffix: DEFAULT_TEMP_INDEX_SUFFIX.to_string(),
        }
    }
}

impl SearchIndexServiceConfig {
    /// Create a config with no batch size limit.
    ///
    /// # Warning
    ///
    /// Use with caution. A single request carrying a whole site can run into
    /// request size limits and timeouts on the backend.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
            ..Default::default()
        }
    }

    /// Create a config with a custom batch size limit.
    ///
    /// # Arguments
    ///
    /// * `max_batch_size` - Maximum number of records sent in a single batch request
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size.max(1)),
            ..Default::default()
        }
    }
}
