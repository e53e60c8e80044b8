//! Search result types for the site search.
//!
//! This module decodes the paginated response returned by the hosted index
//! into a page-at-a-time result set.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::index_record::IndexRecord;

/// Page size assumed when the response does not carry one.
pub const DEFAULT_HITS_PER_PAGE: u64 = 20;

/// One page of search hits plus the metadata of the whole search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultSet {
    /// Hits on the current page, in ranking order.
    pub hits: Vec<IndexRecord>,

    /// Total number of matching records across all pages.
    pub total_count: u64,

    /// 1-based number of the current page.
    pub page: u64,

    /// Page size used for the search.
    pub hits_per_page: u64,

    /// Server processing time in milliseconds.
    pub processing_time_ms: u64,

    /// The query string as echoed by the provider.
    pub query: String,

    /// The encoded parameter string as echoed by the provider.
    /// Useful when debugging search requests.
    pub params: String,
}

impl Default for SearchResultSet {
    fn default() -> Self {
        Self {
            hits: Vec::new(),
            total_count: 0,
            page: 1,
            hits_per_page: DEFAULT_HITS_PER_PAGE,
            processing_time_ms: 0,
            query: String::new(),
            params: String::new(),
        }
    }
}

impl SearchResultSet {
    /// Decode a raw search response.
    ///
    /// Never fails: missing or wrongly typed fields fall back to an empty hit
    /// list, page 0, zero counts and a page size of 20. The provider's 0-based
    /// `page` is translated to a 1-based page number here and nowhere else.
    /// Hits keep every attribute the provider returned; hits that are not
    /// JSON objects are dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use site_search_shared::SearchResultSet;
    ///
    /// let results = SearchResultSet::decode(&json!({
    ///     "hits": [{ "objectID": "home" }],
    ///     "page": 0,
    ///     "nbHits": 1
    /// }));
    /// assert_eq!(results.page, 1);
    /// assert_eq!(results.count(), 1);
    /// ```
    pub fn decode(raw: &Value) -> Self {
        let empty = Map::new();
        let object = raw.as_object().unwrap_or(&empty);

        let hits = object
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| {
                hits.iter()
                    .filter_map(Value::as_object)
                    .map(IndexRecord::from_json_object)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            hits,
            total_count: number(object, "nbHits", 0),
            page: number(object, "page", 0).saturating_add(1),
            hits_per_page: number(object, "hitsPerPage", DEFAULT_HITS_PER_PAGE),
            processing_time_ms: number(object, "processingTimeMS", 0),
            query: string(object, "query"),
            params: string(object, "params"),
        }
    }

    /// Number of hits on the current page.
    ///
    /// Use `total_count` for the number of matches across all pages.
    pub fn count(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexRecord> {
        self.hits.iter()
    }

    pub fn first(&self) -> Option<&IndexRecord> {
        self.hits.first()
    }

    pub fn last(&self) -> Option<&IndexRecord> {
        self.hits.last()
    }

    /// Total number of pages.
    pub fn pages(&self) -> u64 {
        if self.hits_per_page == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.hits_per_page)
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.pages()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }

    pub fn next_page(&self) -> Option<u64> {
        self.has_next_page().then(|| self.page.saturating_add(1))
    }

    pub fn prev_page(&self) -> Option<u64> {
        self.has_prev_page().then_some(self.page - 1)
    }

    /// 1-based position of the first hit on this page within all results.
    pub fn first_hit_position(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        self.page
            .saturating_sub(1)
            .saturating_mul(self.hits_per_page)
            .saturating_add(1)
    }
}

impl<'a> IntoIterator for &'a SearchResultSet {
    type Item = &'a IndexRecord;
    type IntoIter = std::slice::Iter<'a, IndexRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

fn number(object: &Map<String, Value>, key: &str, default: u64) -> u64 {
    object.get(key).and_then(Value::as_u64).unwrap_or(default)
}

fn string(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_empty_object() {
        let results = SearchResultSet::decode(&json!({}));
        assert!(results.is_empty());
        assert_eq!(results.total_count, 0);
        assert_eq!(results.page, 1);
        assert_eq!(results.hits_per_page, 20);
        assert_eq!(results.processing_time_ms, 0);
        assert_eq!(results.query, "");
        assert_eq!(results.params, "");
        assert_eq!(results, SearchResultSet::default());
    }

    #[test]
    fn test_decode_non_object() {
        assert_eq!(
            SearchResultSet::decode(&json!("oops")),
            SearchResultSet::default()
        );
        assert_eq!(
            SearchResultSet::decode(&Value::Null),
            SearchResultSet::default()
        );
    }

    #[test]
    fn test_page_translation() {
        assert_eq!(SearchResultSet::decode(&json!({ "page": 0 })).page, 1);
        assert_eq!(SearchResultSet::decode(&json!({ "page": 4 })).page, 5);
    }

    #[test]
    fn test_decode_hits_and_metadata() {
        let results = SearchResultSet::decode(&json!({
            "hits": [{ "id": 1 }, { "id": 2 }],
            "page": 1,
            "nbHits": 42,
            "hitsPerPage": 20
        }));

        assert_eq!(results.count(), 2);
        assert_eq!(results.page, 2);
        assert_eq!(results.total_count, 42);
        assert_eq!(results.pages(), 3);
        assert!(results.has_next_page());
        assert!(results.has_prev_page());
        assert_eq!(results.next_page(), Some(3));
        assert_eq!(results.prev_page(), Some(1));
        assert_eq!(results.first_hit_position(), 21);
    }

    #[test]
    fn test_decode_keeps_provider_attributes() {
        let results = SearchResultSet::decode(&json!({
            "hits": [{
                "objectID": "blog/hello",
                "title": "Hello",
                "_highlightResult": { "title": { "value": "<em>Hel</em>lo" } }
            }],
            "query": "hel",
            "params": "query=hel&page=0",
            "processingTimeMS": 3
        }));

        let hit = results.first().unwrap();
        assert_eq!(hit.id(), Some("blog/hello".to_string()));
        assert!(hit.contains_key("_highlightResult"));
        assert_eq!(results.query, "hel");
        assert_eq!(results.params, "query=hel&page=0");
        assert_eq!(results.processing_time_ms, 3);
    }

    #[test]
    fn test_wrong_types_fall_back_to_defaults() {
        let results = SearchResultSet::decode(&json!({
            "hits": "nope",
            "page": "2",
            "nbHits": -1,
            "hitsPerPage": null
        }));
        assert_eq!(results, SearchResultSet::default());
    }

    #[test]
    fn test_huge_page_numbers_saturate() {
        let results = SearchResultSet::decode(&json!({ "page": u64::MAX }));
        assert_eq!(results.page, u64::MAX);
        assert_eq!(results.next_page(), None);

        let results = SearchResultSet::decode(&json!({
            "hits": [{ "objectID": "a" }],
            "page": 1u64 << 40,
            "nbHits": u64::MAX,
            "hitsPerPage": 1u64 << 40
        }));
        assert_eq!(results.first_hit_position(), u64::MAX);
        assert!(!results.has_next_page());
    }

    #[test]
    fn test_last_page_has_no_next() {
        let results = SearchResultSet::decode(&json!({
            "hits": [{ "objectID": "a" }],
            "page": 2,
            "nbHits": 41,
            "hitsPerPage": 20
        }));
        assert_eq!(results.page, 3);
        assert!(!results.has_next_page());
        assert_eq!(results.next_page(), None);
    }

    #[test]
    fn test_zero_page_size_has_no_pages() {
        let results = SearchResultSet::decode(&json!({ "nbHits": 5, "hitsPerPage": 0 }));
        assert_eq!(results.pages(), 0);
        assert!(!results.has_next_page());
    }
}
