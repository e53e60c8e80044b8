//! Dependency initialization and wiring for the sync layer.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Settings;
use crate::controller::EventSyncController;
use crate::widget::{IndexWidget, JsonSiteSource, PageSource};
use crate::IndexingError;
use site_search_repository::{AlgoliaProvider, SearchIndexProvider, SearchIndexService};

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: Settings,
    pub service: Arc<SearchIndexService>,
    /// Page hooks; `None` when automatic indexing is disabled.
    pub controller: Option<EventSyncController>,
    /// Manual trigger; `None` when disabled or no site export is configured.
    pub widget: Option<IndexWidget>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`Settings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If a required setting is missing or invalid
    pub fn new() -> Result<Self, IndexingError> {
        let settings = Settings::from_env()?;
        let provider = AlgoliaProvider::new(settings.algolia.clone())
            .map_err(|e| IndexingError::config(format!("Failed to create index client: {}", e)))?;

        info!(
            index = %settings.algolia.index,
            fields = ?settings.fields,
            templates = ?settings.templates,
            auto_index = settings.sync.auto_index,
            widget = settings.sync.widget,
            batch_size = settings.batch_size,
            "Initializing dependencies"
        );

        let source = settings
            .site_export_path
            .clone()
            .map(|path| Arc::new(JsonSiteSource::new(path)) as Arc<dyn PageSource>);

        Ok(Self::with_provider(settings, Arc::new(provider), source))
    }

    /// Wire the components around an already constructed provider.
    ///
    /// # Arguments
    ///
    /// * `settings` - Validated settings
    /// * `provider` - Index backend shared by every component
    /// * `source` - Site tree for manual rebuilds, if one is available
    pub fn with_provider(
        settings: Settings,
        provider: Arc<dyn SearchIndexProvider>,
        source: Option<Arc<dyn PageSource>>,
    ) -> Self {
        let service = Arc::new(SearchIndexService::with_config(
            provider,
            settings.service_config(),
        ));

        let controller =
            EventSyncController::register(&settings.sync, service.clone(), settings.mapper());

        let widget = match (settings.sync.widget, source) {
            (true, Some(source)) => Some(IndexWidget::new(
                service.clone(),
                settings.mapper(),
                source,
            )),
            (true, None) => {
                warn!("Manual reindex unavailable: SITE_EXPORT_PATH is not set");
                None
            }
            (false, _) => None,
        };

        Self {
            settings,
            service,
            controller,
            widget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use site_search_repository::{AlgoliaConfig, InMemoryProvider};
    use site_search_shared::Page;

    fn settings(sync: SyncConfig) -> Settings {
        Settings {
            algolia: AlgoliaConfig::new("APP123", "secret", "pages"),
            fields: vec!["text".to_string()],
            templates: Vec::new(),
            sync,
            batch_size: 100,
            site_export_path: None,
        }
    }

    fn source() -> Option<Arc<dyn PageSource>> {
        Some(Arc::new(vec![Page::new("home")]))
    }

    #[test]
    fn test_everything_enabled() {
        let deps = Dependencies::with_provider(
            settings(SyncConfig::default()),
            Arc::new(InMemoryProvider::new("pages")),
            source(),
        );
        assert!(deps.controller.is_some());
        assert!(deps.widget.is_some());
        assert_eq!(deps.service.index_name(), "pages");
    }

    #[test]
    fn test_switches_disable_components() {
        let deps = Dependencies::with_provider(
            settings(SyncConfig {
                auto_index: false,
                widget: false,
            }),
            Arc::new(InMemoryProvider::new("pages")),
            source(),
        );
        assert!(deps.controller.is_none());
        assert!(deps.widget.is_none());
    }

    #[test]
    fn test_widget_needs_a_page_source() {
        let deps = Dependencies::with_provider(
            settings(SyncConfig::default()),
            Arc::new(InMemoryProvider::new("pages")),
            None,
        );
        assert!(deps.controller.is_some());
        assert!(deps.widget.is_none());
    }
}
