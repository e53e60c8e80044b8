//! Search query types for the site search.
//!
//! This module defines the query structure passed to the search index.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Largest page size the hosted index accepts.
pub const MAX_HITS_PER_PAGE: u32 = 1000;

/// Search query parameters.
///
/// Pages are 1-based here, matching the result set handed back to callers.
/// Translation to the provider's 0-based page index happens in
/// [`SearchQuery::service_page`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    /// The search query string. An empty query matches every record.
    pub query: String,

    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Page size. `None` leaves it to the index settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits_per_page: Option<u32>,

    /// Additional provider parameters (filters, attributesToRetrieve, ...).
    #[serde(default)]
    pub params: IndexMap<String, String>,
}

fn default_page() -> u32 {
    1
}

impl SearchQuery {
    /// Create a query for the first page.
    ///
    /// # Example
    ///
    /// ```
    /// use site_search_shared::SearchQuery;
    ///
    /// let query = SearchQuery::new("kirby").with_page(2).with_param("filters", "visible:true");
    /// assert_eq!(query.service_page(), 1);
    /// ```
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: default_page(),
            hits_per_page: None,
            params: IndexMap::new(),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the page size.
    pub fn with_hits_per_page(mut self, hits_per_page: u32) -> Self {
        self.hits_per_page = Some(hits_per_page.min(MAX_HITS_PER_PAGE)); // Cap at 1000
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The 0-based page index sent to the provider.
    pub fn service_page(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    /// Validate the query parameters.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.page == 0 {
            return Err("Page numbers start at 1".to_string());
        }

        if self.hits_per_page == Some(0) {
            return Err("hits_per_page must be greater than 0".to_string());
        }

        if let Some(n) = self.hits_per_page.filter(|n| *n > MAX_HITS_PER_PAGE) {
            return Err(format!(
                "hits_per_page {} exceeds the maximum of {}",
                n, MAX_HITS_PER_PAGE
            ));
        }

        for reserved in ["query", "page", "hitsPerPage"] {
            if self.params.contains_key(reserved) {
                return Err(format!(
                    "'{}' must be set through the query fields, not params",
                    reserved
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let query = SearchQuery::new("test");
        assert_eq!(query.query, "test");
        assert_eq!(query.page, 1);
        assert_eq!(query.service_page(), 0);
        assert!(query.hits_per_page.is_none());
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_service_page_is_zero_based() {
        assert_eq!(SearchQuery::new("x").with_page(5).service_page(), 4);
    }

    #[test]
    fn test_with_hits_per_page_caps() {
        let query = SearchQuery::new("x").with_hits_per_page(5000);
        assert_eq!(query.hits_per_page, Some(MAX_HITS_PER_PAGE));
    }

    #[test]
    fn test_validation() {
        assert!(SearchQuery::new("").validate().is_ok());
        assert!(SearchQuery::new("x").with_page(0).validate().is_err());

        let mut query = SearchQuery::new("x");
        query.hits_per_page = Some(0);
        assert!(query.validate().is_err());

        let query = SearchQuery::new("x").with_param("page", "3");
        assert!(query.validate().is_err());

        let query = SearchQuery::new("x").with_param("filters", "visible:true");
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_oversized_pages() {
        let query: SearchQuery =
            serde_json::from_str(r#"{ "query": "x", "hits_per_page": 5000 }"#).unwrap();
        assert!(query.validate().unwrap_err().contains("1000"));

        let mut query = SearchQuery::new("x");
        query.hits_per_page = Some(MAX_HITS_PER_PAGE);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_deserialize_defaults() {
        let query: SearchQuery = serde_json::from_str(r#"{ "query": "hello" }"#).unwrap();
        assert_eq!(query, SearchQuery::new("hello"));
    }
}
