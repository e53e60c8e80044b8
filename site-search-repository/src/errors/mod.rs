//! Error types for the site search repository.
//!
//! This module provides a unified error type for all search index operations.

mod search_index_error;

pub use search_index_error::{FailedStep, SearchIndexError};
