//! # Site Search Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search index. It includes definitions for errors, interfaces, the index
//! client adapter used by the sync layer, a client for the hosted search REST
//! API and an in-memory provider for tests and local runs.

pub mod algolia;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod service;
pub mod types;
pub mod utils;

pub use algolia::{AlgoliaConfig, AlgoliaProvider};
pub use config::SearchIndexServiceConfig;
pub use errors::{FailedStep, SearchIndexError};
pub use interfaces::SearchIndexProvider;
pub use memory::{InMemoryProvider, ProviderCall};
pub use service::SearchIndexService;
pub use types::{BatchOperationResult, BatchOperationSummary};
pub use utils::{encode_search_params, validate_object_id};
