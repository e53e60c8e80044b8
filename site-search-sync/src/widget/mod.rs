//! Manual reindex trigger.
//!
//! The widget shows how many records the index holds and offers a single
//! action that rebuilds the whole index from the current site tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument};

use crate::errors::SyncError;
use site_search_repository::SearchIndexService;
use site_search_shared::{DocumentMapper, Page};

/// Heading shown above the widget.
pub const WIDGET_TITLE: &str = "Search Index";

/// Route that triggers a full rebuild.
pub const REINDEX_ROUTE: &str = "/widgets/search-index/index";

/// Where the panel goes after a rebuild.
pub const REINDEX_REDIRECT: &str = "/";

/// Supplies the full site tree for a rebuild.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Load the top-level pages of the site, each with its children.
    async fn load_pages(&self) -> Result<Vec<Page>, SyncError>;
}

#[async_trait]
impl PageSource for Vec<Page> {
    async fn load_pages(&self) -> Result<Vec<Page>, SyncError> {
        Ok(self.clone())
    }
}

/// Reads the site tree from a JSON export: an array of pages with nested `children`.
#[derive(Debug, Clone)]
pub struct JsonSiteSource {
    path: PathBuf,
}

impl JsonSiteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PageSource for JsonSiteSource {
    async fn load_pages(&self) -> Result<Vec<Page>, SyncError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SyncError::source(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let pages: Vec<Page> = serde_json::from_str(&raw)?;
        Ok(pages)
    }
}

/// An action offered by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetOption {
    pub label: String,
    pub icon: String,
    pub route: String,
}

/// What the panel renders for the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetView {
    pub title: String,
    /// Records currently in the live index.
    pub count: u64,
    pub options: Vec<WidgetOption>,
}

/// Result of a manual rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexAck {
    /// Records written by the rebuild.
    pub indexed: usize,
    pub message: String,
    pub redirect: String,
}

/// Status view and manual trigger for a full rebuild.
pub struct IndexWidget {
    service: Arc<SearchIndexService>,
    mapper: DocumentMapper,
    source: Arc<dyn PageSource>,
}

impl IndexWidget {
    pub fn new(
        service: Arc<SearchIndexService>,
        mapper: DocumentMapper,
        source: Arc<dyn PageSource>,
    ) -> Self {
        Self {
            service,
            mapper,
            source,
        }
    }

    /// Build the widget view with the live record count.
    pub async fn render(&self) -> Result<WidgetView, SyncError> {
        let count = self.service.object_count().await?;
        Ok(WidgetView {
            title: WIDGET_TITLE.to_string(),
            count,
            options: vec![WidgetOption {
                label: "Manual Refresh".to_string(),
                icon: "refresh".to_string(),
                route: REINDEX_ROUTE.to_string(),
            }],
        })
    }

    /// Rebuild the whole index from the current site tree.
    ///
    /// Running it twice in a row leaves the index in the same state.
    #[instrument(skip(self), fields(index = %self.service.index_name()))]
    pub async fn trigger_reindex(&self) -> Result<ReindexAck, SyncError> {
        let pages = self.source.load_pages().await?;
        let indexed = self.service.rebuild_full(&pages, &self.mapper).await?;

        info!(indexed = indexed, "Manual reindex completed");

        Ok(ReindexAck {
            indexed,
            message: format!("The search index has been rebuilt with {} pages", indexed),
            redirect: REINDEX_REDIRECT.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use site_search_repository::{InMemoryProvider, SearchIndexError};
    use std::io::Write;

    fn site() -> Vec<Page> {
        vec![
            Page::new("home").with_title("Home"),
            Page::new("blog")
                .with_title("Blog")
                .with_child(Page::new("blog/hello").with_title("Hello")),
        ]
    }

    fn widget_with(provider: &Arc<InMemoryProvider>, pages: Vec<Page>) -> IndexWidget {
        IndexWidget::new(
            Arc::new(SearchIndexService::new(provider.clone())),
            DocumentMapper::default(),
            Arc::new(pages),
        )
    }

    #[tokio::test]
    async fn test_render_shows_count_and_refresh_option() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let widget = widget_with(&provider, site());
        widget.trigger_reindex().await.unwrap();

        let view = widget.render().await.unwrap();

        assert_eq!(view.title, "Search Index");
        assert_eq!(view.count, 3);
        assert_eq!(view.options.len(), 1);
        assert_eq!(view.options[0].label, "Manual Refresh");
        assert_eq!(view.options[0].route, REINDEX_ROUTE);
    }

    #[tokio::test]
    async fn test_trigger_reindex_is_idempotent() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let widget = widget_with(&provider, site());

        let first = widget.trigger_reindex().await.unwrap();
        let records = provider.records();
        let second = widget.trigger_reindex().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.indexed, 3);
        assert_eq!(first.redirect, "/");
        assert_eq!(provider.records(), records);
    }

    #[tokio::test]
    async fn test_trigger_reindex_surfaces_index_errors() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        provider.set_offline(true);
        let widget = widget_with(&provider, site());

        let err = widget.trigger_reindex().await.unwrap_err();
        assert!(matches!(
            err.index_error(),
            Some(SearchIndexError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_json_site_source() {
        let path = std::env::temp_dir().join(format!("site-search-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"[{{"id": "home", "title": "Home", "children": [{{"id": "home/about"}}]}}]"#
        )
        .unwrap();

        let pages = JsonSiteSource::new(&path).load_pages().await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title.as_deref(), Some("Home"));
        assert_eq!(pages[0].descendant_ids(), vec!["home/about"]);
    }

    #[tokio::test]
    async fn test_json_site_source_missing_file() {
        let err = JsonSiteSource::new("/nonexistent/site.json")
            .load_pages()
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::SourceError(_)));
    }
}
