//! # Site Search Sync
//!
//! Keeps a hosted search index in step with the pages of a CMS site.
//!
//! ## Architecture
//!
//! The sync layer sits between the CMS and the index client:
//!
//! 1. **Controller**: Receives page lifecycle events and mirrors each one into the index
//! 2. **Widget**: Shows the index size and triggers a full rebuild on demand
//! 3. **Config**: Reads settings from the environment and wires the components together
//!
//! Mapping pages to records lives in `site-search-shared`; talking to the index lives in
//! `site-search-repository`.
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`controller`]: Page lifecycle hooks
//! - [`widget`]: Manual reindex trigger and index status view
//! - [`errors`]: Error types for the sync layer

pub mod config;
pub mod controller;
pub mod errors;
pub mod widget;

pub use config::{Dependencies, Settings, SyncConfig};
pub use controller::{dispatch, EventSyncController, LifecycleSink, PageEvent};
pub use errors::SyncError;
pub use widget::{IndexWidget, JsonSiteSource, PageSource, ReindexAck, WidgetOption, WidgetView};

use thiserror::Error;

use site_search_repository::SearchIndexError;

/// Errors that can occur during startup or while running a command.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Sync error.
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),

    /// Invalid command line.
    #[error("Usage error: {0}")]
    UsageError(String),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::UsageError(msg.into())
    }
}

impl From<SearchIndexError> for IndexingError {
    fn from(err: SearchIndexError) -> Self {
        match err {
            SearchIndexError::ConfigurationError(msg) => Self::ConfigError(msg),
            other => Self::SyncError(SyncError::from(other)),
        }
    }
}
