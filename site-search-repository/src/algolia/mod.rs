//! Hosted search implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! that talks to an Algolia-compatible REST API.

mod config;
mod provider;

pub use config::{AlgoliaConfig, DEFAULT_TIMEOUT};
pub use provider::AlgoliaProvider;
