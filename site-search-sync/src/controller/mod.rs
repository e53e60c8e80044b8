//! Page lifecycle hooks.
//!
//! Mirrors every page change the CMS reports into the search index. Each hook
//! finishes its remote calls before returning, and failures are handed back
//! to the caller without retries; a full rebuild repairs anything missed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::SyncConfig;
use crate::errors::SyncError;
use site_search_repository::SearchIndexService;
use site_search_shared::{DocumentMapper, Page};

/// Receives page lifecycle events from the CMS.
#[async_trait]
pub trait LifecycleSink: Send + Sync {
    async fn page_created(&self, page: &Page) -> Result<(), SyncError>;

    async fn page_updated(&self, page: &Page) -> Result<(), SyncError>;

    /// Called with the page as it was before deletion, children included.
    async fn page_deleted(&self, page: &Page) -> Result<(), SyncError>;

    async fn page_sorted(&self, page: &Page) -> Result<(), SyncError>;

    async fn page_visibility_changed(&self, page: &Page) -> Result<(), SyncError>;

    /// Called when a page changes its identifier.
    async fn page_moved(&self, old: &Page, new: &Page) -> Result<(), SyncError>;
}

/// A page lifecycle event, for hosts that deliver events as values.
///
/// Serialized with an `event` tag, e.g.
/// `{"event": "moved", "old": {"id": "a"}, "new": {"id": "b"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PageEvent {
    Created(Page),
    Updated(Page),
    Deleted(Page),
    Sorted(Page),
    VisibilityChanged(Page),
    Moved { old: Page, new: Page },
}

impl PageEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Deleted(_) => "deleted",
            Self::Sorted(_) => "sorted",
            Self::VisibilityChanged(_) => "visibility_changed",
            Self::Moved { .. } => "moved",
        }
    }

    /// The page the event is about; the new page for a move.
    pub fn page(&self) -> &Page {
        match self {
            Self::Created(page)
            | Self::Updated(page)
            | Self::Deleted(page)
            | Self::Sorted(page)
            | Self::VisibilityChanged(page) => page,
            Self::Moved { new, .. } => new,
        }
    }
}

/// Route an event to the matching hook of `sink`.
pub async fn dispatch(sink: &dyn LifecycleSink, event: &PageEvent) -> Result<(), SyncError> {
    match event {
        PageEvent::Created(page) => sink.page_created(page).await,
        PageEvent::Updated(page) => sink.page_updated(page).await,
        PageEvent::Deleted(page) => sink.page_deleted(page).await,
        PageEvent::Sorted(page) => sink.page_sorted(page).await,
        PageEvent::VisibilityChanged(page) => sink.page_visibility_changed(page).await,
        PageEvent::Moved { old, new } => sink.page_moved(old, new).await,
    }
}

/// Keeps the index in step with page lifecycle events.
///
/// Pages outside the template allow-list are never written. When such a page
/// changes, its record is deleted in case an earlier template put it in the
/// index.
pub struct EventSyncController {
    service: Arc<SearchIndexService>,
    mapper: DocumentMapper,
}

impl EventSyncController {
    pub fn new(service: Arc<SearchIndexService>, mapper: DocumentMapper) -> Self {
        Self { service, mapper }
    }

    /// Build the controller when automatic indexing is enabled.
    ///
    /// Returns `None` when `auto_index` is off, in which case no hooks should be
    /// installed and the index only changes through a manual rebuild.
    pub fn register(
        config: &SyncConfig,
        service: Arc<SearchIndexService>,
        mapper: DocumentMapper,
    ) -> Option<Self> {
        if !config.auto_index {
            info!("Automatic indexing disabled; page hooks not registered");
            return None;
        }
        Some(Self::new(service, mapper))
    }

    pub fn mapper(&self) -> &DocumentMapper {
        &self.mapper
    }

    /// Write the page's current state, or remove it if it no longer qualifies.
    async fn refresh(&self, page: &Page) -> Result<(), SyncError> {
        if !self.mapper.is_indexable(page) {
            debug!(page_id = %page.id, "Page not indexable, removing any stale record");
            self.service.delete(&page.id).await?;
            return Ok(());
        }
        self.service.update(&self.mapper.to_record(page)).await?;
        Ok(())
    }
}

#[async_trait]
impl LifecycleSink for EventSyncController {
    #[instrument(skip(self, page), fields(page_id = %page.id))]
    async fn page_created(&self, page: &Page) -> Result<(), SyncError> {
        if !self.mapper.is_indexable(page) {
            debug!("Page not indexable, skipping");
            return Ok(());
        }
        self.service.insert(&self.mapper.to_record(page)).await?;
        Ok(())
    }

    #[instrument(skip(self, page), fields(page_id = %page.id))]
    async fn page_updated(&self, page: &Page) -> Result<(), SyncError> {
        self.refresh(page).await
    }

    #[instrument(skip(self, page), fields(page_id = %page.id))]
    async fn page_deleted(&self, page: &Page) -> Result<(), SyncError> {
        self.service
            .delete_recursive(&page.id, &page.descendant_ids())
            .await?;
        Ok(())
    }

    #[instrument(skip(self, page), fields(page_id = %page.id))]
    async fn page_sorted(&self, page: &Page) -> Result<(), SyncError> {
        self.refresh(page).await
    }

    #[instrument(skip(self, page), fields(page_id = %page.id, visible = page.visible))]
    async fn page_visibility_changed(&self, page: &Page) -> Result<(), SyncError> {
        self.refresh(page).await
    }

    #[instrument(skip(self, old, new), fields(old_id = %old.id, new_id = %new.id))]
    async fn page_moved(&self, old: &Page, new: &Page) -> Result<(), SyncError> {
        if !self.mapper.is_indexable(new) {
            debug!("Moved page not indexable, removing old record");
            self.service.delete(&old.id).await?;
            return Ok(());
        }
        self.service
            .move_record(&old.id, &self.mapper.to_record(new))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use site_search_repository::{InMemoryProvider, ProviderCall, SearchIndexError};

    fn controller_with(
        provider: &Arc<InMemoryProvider>,
        mapper: DocumentMapper,
    ) -> EventSyncController {
        EventSyncController::new(Arc::new(SearchIndexService::new(provider.clone())), mapper)
    }

    fn articles_only() -> DocumentMapper {
        DocumentMapper::new(vec!["text".into()], vec!["article".into()])
    }

    #[tokio::test]
    async fn test_created_page_is_indexed() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let controller = controller_with(&provider, DocumentMapper::default());

        controller
            .page_created(&Page::new("42").with_title("Hello"))
            .await
            .unwrap();

        let record = provider.get("42").unwrap();
        assert_eq!(record.get_str("title"), Some("Hello"));
    }

    #[tokio::test]
    async fn test_created_page_outside_templates_is_skipped() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let controller = controller_with(&provider, articles_only());

        controller
            .page_created(&Page::new("home").with_template("home"))
            .await
            .unwrap();

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_outside_templates_deletes_record() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let controller = controller_with(&provider, articles_only());
        let page = Page::new("blog/a").with_template("article");
        controller.page_created(&page).await.unwrap();

        controller
            .page_updated(&page.clone().with_template("default"))
            .await
            .unwrap();

        assert!(provider.is_empty());
        assert_eq!(provider.deleted_ids(), vec!["blog/a"]);
    }

    #[tokio::test]
    async fn test_sorted_and_visibility_changes_update_record() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let controller = controller_with(&provider, DocumentMapper::default());
        let page = Page::new("blog/a");
        controller.page_created(&page).await.unwrap();

        controller.page_sorted(&page.clone().listed(2)).await.unwrap();
        let record = provider.get("blog/a").unwrap();
        assert_eq!(record.get("num").and_then(|v| v.as_i64()), Some(2));

        let mut hidden = page.clone().listed(2);
        hidden.visible = false;
        controller.page_visibility_changed(&hidden).await.unwrap();
        let record = provider.get("blog/a").unwrap();
        assert_eq!(record.get("visible").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(provider.saved_ids(), vec!["blog/a", "blog/a", "blog/a"]);
    }

    #[tokio::test]
    async fn test_moved_page_outside_templates_removes_old_record() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let controller = controller_with(&provider, articles_only());
        let old = Page::new("drafts/a").with_template("article");
        controller.page_created(&old).await.unwrap();

        controller
            .page_moved(&old, &Page::new("archive/a").with_template("archive"))
            .await
            .unwrap();

        assert!(provider.is_empty());
        assert!(!provider.saved_ids().contains(&"archive/a".to_string()));
    }

    #[tokio::test]
    async fn test_register_respects_auto_index() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let service = Arc::new(SearchIndexService::new(provider.clone()));

        let off = SyncConfig {
            auto_index: false,
            widget: true,
        };
        let mapper = DocumentMapper::default();

        assert!(EventSyncController::register(&off, service.clone(), mapper.clone()).is_none());
        assert!(EventSyncController::register(&SyncConfig::default(), service, mapper).is_some());
    }

    #[tokio::test]
    async fn test_dispatch_routes_events() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let controller = controller_with(&provider, DocumentMapper::default());
        let old = Page::new("a");
        let new = Page::new("b");

        for event in [
            PageEvent::Created(old.clone()),
            PageEvent::Moved {
                old: old.clone(),
                new: new.clone(),
            },
            PageEvent::Deleted(new.clone()),
        ] {
            dispatch(&controller, &event).await.unwrap();
        }

        assert_eq!(
            provider.calls(),
            vec![
                ProviderCall::Save("a".to_string()),
                ProviderCall::Delete("a".to_string()),
                ProviderCall::Save("b".to_string()),
                ProviderCall::Delete("b".to_string()),
            ]
        );
        assert!(provider.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_returned() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        provider.set_offline(true);
        let controller = controller_with(&provider, DocumentMapper::default());

        let err = controller.page_created(&Page::new("a")).await.unwrap_err();
        assert!(matches!(
            err.index_error(),
            Some(SearchIndexError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_json_events_dispatch() {
        let provider = Arc::new(InMemoryProvider::new("pages"));
        let controller = controller_with(&provider, DocumentMapper::default());

        let events: Vec<PageEvent> = serde_json::from_str(
            r#"[
                {"event": "created", "id": "drafts/a", "title": "A"},
                {"event": "visibility_changed", "id": "drafts/a", "visible": true},
                {"event": "moved", "old": {"id": "drafts/a"}, "new": {"id": "blog/a"}}
            ]"#,
        )
        .unwrap();
        assert_eq!(events[1], PageEvent::VisibilityChanged({
            let mut page = Page::new("drafts/a");
            page.visible = true;
            page
        }));

        for event in &events {
            dispatch(&controller, event).await.unwrap();
        }

        assert!(provider.get("drafts/a").is_none());
        assert!(provider.get("blog/a").is_some());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let value = serde_json::to_value(PageEvent::Deleted(Page::new("blog"))).unwrap();
        assert_eq!(value["event"], "deleted");
        assert_eq!(value["id"], "blog");
    }

    #[test]
    fn test_event_accessors() {
        let event = PageEvent::Moved {
            old: Page::new("a"),
            new: Page::new("b"),
        };
        assert_eq!(event.name(), "moved");
        assert_eq!(event.page().id, "b");
        assert_eq!(PageEvent::Sorted(Page::new("c")).name(), "sorted");
    }
}
