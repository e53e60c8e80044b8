//! Error types for the sync layer.

use thiserror::Error;

use site_search_repository::SearchIndexError;

/// Errors that can occur while syncing pages to the search index.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Error from the index client.
    #[error("Index error: {0}")]
    IndexError(#[from] SearchIndexError),

    /// The site tree could not be loaded.
    #[error("Page source error: {0}")]
    SourceError(String),

    /// Error parsing or decoding site data.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SyncError {
    /// Create a page source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// The underlying index error, if any.
    pub fn index_error(&self) -> Option<&SearchIndexError> {
        match self {
            Self::IndexError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
