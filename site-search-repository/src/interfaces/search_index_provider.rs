//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (hosted REST API, in-memory).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use site_search_shared::{IndexRecord, SearchQuery};

/// Abstracts the underlying search index implementation.
///
/// This trait defines the interface for all search index backend implementations. Implementations
/// are injected into `SearchIndexService` to enable dependency injection and easy testing with
/// mock implementations.
///
/// All methods return `Result<T, SearchIndexError>` for consistent error handling across
/// different backend implementations. Implementations never retry; every failure is handed
/// back to the caller.
///
/// # Note on Document Creation
///
/// There is no separate `create_object` function. `save_object` replaces the whole record
/// stored under the record's `objectID`, creating it if it doesn't exist, so saving the same
/// record twice leaves the index as if it had been saved once.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Name of the live index all single-record operations target.
    fn index_name(&self) -> &str;

    /// Create or replace a record in the live index (upsert by `objectID`).
    ///
    /// # Arguments
    ///
    /// * `record` - The record to store; must carry an `objectID`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record was stored
    /// * `Err(SearchIndexError)` - If the operation fails
    async fn save_object(&self, record: &IndexRecord) -> Result<(), SearchIndexError>;

    /// Delete a record from the live index.
    ///
    /// If the record doesn't exist, the operation is considered successful.
    ///
    /// # Arguments
    ///
    /// * `object_id` - Identifier of the record to delete
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record was deleted (or didn't exist)
    /// * `Err(SearchIndexError)` - If the deletion fails
    async fn delete_object(&self, object_id: &str) -> Result<(), SearchIndexError>;

    /// Delete several records and return a summary of successful and failed deletions.
    ///
    /// Issues one delete per identifier, in order, and keeps going after a failure so the
    /// summary says exactly which records are gone. Records that don't exist count as
    /// successful deletions.
    ///
    /// # Arguments
    ///
    /// * `object_ids` - Identifiers of the records to delete
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Contains aggregate statistics and individual results
    /// * `Err(SearchIndexError)` - If the operation fails entirely
    async fn delete_objects(
        &self,
        object_ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut results = Vec::with_capacity(object_ids.len());
        for object_id in object_ids {
            match self.delete_object(object_id).await {
                Ok(()) => results.push(BatchOperationResult::succeeded(object_id.clone())),
                Err(e) => results.push(BatchOperationResult::failed(object_id.clone(), e)),
            }
        }
        Ok(BatchOperationSummary::from_results(results))
    }

    /// Create or replace many records in the named index with a single request.
    ///
    /// # Arguments
    ///
    /// * `index` - Target index name (the live index or a rebuild scratch index)
    /// * `records` - Records to store; each must carry an `objectID`
    async fn save_objects(
        &self,
        index: &str,
        records: &[IndexRecord],
    ) -> Result<(), SearchIndexError>;

    /// Remove every record from the named index. A missing index counts as cleared.
    async fn clear_index(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Atomically replace `destination` with `source`; `source` ceases to exist.
    async fn move_index(&self, source: &str, destination: &str) -> Result<(), SearchIndexError>;

    /// Run a search against the live index and return the raw response body.
    ///
    /// Decoding is left to `SearchResultSet::decode` so the page translation happens once.
    async fn search(&self, query: &SearchQuery) -> Result<Value, SearchIndexError>;

    /// Number of records currently stored in the live index.
    async fn object_count(&self) -> Result<u64, SearchIndexError>;
}
