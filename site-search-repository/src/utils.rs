//! Utility functions for the site search repository.

use url::form_urlencoded;

use crate::errors::SearchIndexError;
use site_search_shared::SearchQuery;

/// Validate a record identifier.
///
/// Identifiers are page URI paths; they must be non-empty and must not carry
/// surrounding whitespace, which the CMS never produces.
///
/// # Example
///
/// ```
/// use site_search_repository::validate_object_id;
///
/// assert!(validate_object_id("blog/hello").is_ok());
/// assert!(validate_object_id("").is_err());
/// ```
pub fn validate_object_id(object_id: &str) -> Result<(), SearchIndexError> {
    if object_id.is_empty() {
        return Err(SearchIndexError::validation("objectID is required"));
    }
    if object_id.trim() != object_id {
        return Err(SearchIndexError::validation(format!(
            "objectID '{}' has surrounding whitespace",
            object_id
        )));
    }
    Ok(())
}

/// Encode a query into the URL-encoded parameter string understood by the
/// hosted index (`query=...&page=...&hitsPerPage=...`).
///
/// The page is sent 0-based.
pub fn encode_search_params(query: &SearchQuery) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("query", &query.query);
    serializer.append_pair("page", &query.service_page().to_string());
    if let Some(hits_per_page) = query.hits_per_page {
        serializer.append_pair("hitsPerPage", &hits_per_page.to_string());
    }
    for (key, value) in &query.params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_object_id() {
        assert!(validate_object_id("home").is_ok());
        assert!(validate_object_id("blog/2024/hello-world").is_ok());
        assert!(matches!(
            validate_object_id(""),
            Err(SearchIndexError::ValidationError(_))
        ));
        assert!(matches!(
            validate_object_id(" home"),
            Err(SearchIndexError::ValidationError(_))
        ));
    }

    #[test]
    fn test_encode_search_params() {
        let query = SearchQuery::new("hello world")
            .with_page(3)
            .with_hits_per_page(10)
            .with_param("filters", "template:article");

        assert_eq!(
            encode_search_params(&query),
            "query=hello+world&page=2&hitsPerPage=10&filters=template%3Aarticle"
        );
    }

    #[test]
    fn test_encode_search_params_first_page() {
        assert_eq!(
            encode_search_params(&SearchQuery::new("")),
            "query=&page=0"
        );
    }
}
