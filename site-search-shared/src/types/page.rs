//! CMS page representation.
//!
//! The page model itself belongs to the CMS. This is the subset of it the sync
//! layer reads: identity, addressing, presentation state, content fields and
//! the child tree used for recursive deletes and full rebuilds.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A page as observed by the sync layer.
///
/// # Fields
///
/// - `id`: URI path of the page (e.g. `blog/hello`), unique within the site
/// - `url`: Absolute URL of the page
/// - `title`: Page title
/// - `template`: Name of the template the page renders with
/// - `visible`: Whether the page is listed
/// - `num`: Sort number of a listed page
/// - `modified`: Last modification time
/// - `content`: Remaining content fields in blueprint order
/// - `children`: Direct subpages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: IndexMap<String, String>,
    #[serde(default)]
    pub children: Vec<Page>,
}

impl Page {
    /// Create a page with only its identifier set.
    ///
    /// # Example
    ///
    /// ```
    /// use site_search_shared::Page;
    ///
    /// let page = Page::new("blog/hello")
    ///     .with_title("Hello")
    ///     .with_field("text", "Lorem ipsum");
    /// assert_eq!(page.field("text"), Some("Lorem ipsum"));
    /// ```
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Mark the page as listed with the given sort number.
    pub fn listed(mut self, num: u32) -> Self {
        self.visible = true;
        self.num = Some(num);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.content.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Page) -> Self {
        self.children.push(child);
        self
    }

    /// Read a content field.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.content.get(key).map(String::as_str)
    }

    /// All descendants of this page, depth-first, parents before children.
    /// The page itself is not included.
    pub fn descendants(&self) -> Vec<&Page> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    /// Identifiers of every descendant, in the order of [`Page::descendants`].
    pub fn descendant_ids(&self) -> Vec<String> {
        self.descendants()
            .into_iter()
            .map(|page| page.id.clone())
            .collect()
    }

    /// Flatten a list of top-level pages into the whole site tree.
    pub fn flatten(pages: &[Page]) -> Vec<&Page> {
        let mut out = Vec::new();
        for page in pages {
            out.push(page);
            out.extend(page.descendants());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> Page {
        Page::new("blog")
            .with_child(
                Page::new("blog/a")
                    .with_child(Page::new("blog/a/gallery"))
                    .with_child(Page::new("blog/a/notes")),
            )
            .with_child(Page::new("blog/b"))
    }

    #[test]
    fn test_descendant_ids_depth_first() {
        assert_eq!(
            blog().descendant_ids(),
            vec!["blog/a", "blog/a/gallery", "blog/a/notes", "blog/b"]
        );
    }

    #[test]
    fn test_leaf_has_no_descendants() {
        assert!(Page::new("about").descendant_ids().is_empty());
    }

    #[test]
    fn test_flatten_includes_roots() {
        let site = vec![Page::new("home"), blog()];
        let ids: Vec<&str> = Page::flatten(&site).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "home",
                "blog",
                "blog/a",
                "blog/a/gallery",
                "blog/a/notes",
                "blog/b"
            ]
        );
    }

    #[test]
    fn test_deserialize_minimal_page() {
        let page: Page = serde_json::from_str(r#"{ "id": "about" }"#).unwrap();
        assert_eq!(page, Page::new("about"));
        assert!(!page.visible);
        assert!(page.children.is_empty());
    }

    #[test]
    fn test_listed() {
        let page = Page::new("about").listed(2);
        assert!(page.visible);
        assert_eq!(page.num, Some(2));
    }
}
