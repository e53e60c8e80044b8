//! Search index service implementation.
//!
//! This module provides the index client adapter: the high-level operations
//! the sync layer performs against the search index (insert, update, delete,
//! recursive delete, move, full rebuild, object count and search).
//!
//! # Note on Document Creation
//!
//! `insert` and `update` are the same upsert. Both exist so that call sites
//! read like the lifecycle event they handle.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SearchIndexServiceConfig;
use crate::errors::{FailedStep, SearchIndexError};
use crate::interfaces::SearchIndexProvider;
use crate::types::BatchOperationSummary;
use crate::utils::validate_object_id;
use site_search_shared::{DocumentMapper, IndexRecord, Page, SearchQuery, SearchResultSet};

/// The main service for interacting with the search index.
///
/// This is the high-level API that application code should use. It validates input,
/// sequences multi-step operations and delegates every remote call to a
/// `SearchIndexProvider`. Nothing is retried: failures are returned to the caller, and
/// a full rebuild is the recovery path for anything missed.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use site_search_repository::algolia::{AlgoliaConfig, AlgoliaProvider};
/// use site_search_repository::SearchIndexService;
/// use site_search_shared::{to_record, Page};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AlgoliaConfig::new("APP_ID", "API_KEY", "pages");
/// let provider = Arc::new(AlgoliaProvider::new(config)?);
/// let service = SearchIndexService::new(provider);
///
/// let page = Page::new("blog/hello").with_title("Hello");
/// service.insert(&to_record(&page)).await?;
/// # Ok(())
/// # }
/// ```
pub struct SearchIndexService {
    provider: Arc<dyn SearchIndexProvider>,
    config: SearchIndexServiceConfig,
}

impl SearchIndexService {
    /// Create a new SearchIndexService with default configuration.
    ///
    /// The default configuration sends at most 1000 records per batch request.
    ///
    /// # Arguments
    ///
    /// * `provider` - A shared implementation of `SearchIndexProvider`
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexServiceConfig::default(),
        }
    }

    /// Create a new SearchIndexService with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `provider` - A shared implementation of `SearchIndexProvider`
    /// * `config` - Custom configuration for the service
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self { provider, config }
    }

    /// Name of the live index.
    pub fn index_name(&self) -> &str {
        self.provider.index_name()
    }

    fn record_id(record: &IndexRecord) -> Result<String, SearchIndexError> {
        let object_id = record
            .id()
            .ok_or_else(|| SearchIndexError::validation("record has no objectID"))?;
        validate_object_id(&object_id)?;
        Ok(object_id)
    }

    /// Store a record, creating or replacing it by its `objectID`.
    ///
    /// Calling this twice with the same record leaves the index as if it had been
    /// called once.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record was stored
    /// * `Err(SearchIndexError::ValidationError)` - If the record has no usable `objectID`
    /// * `Err(SearchIndexError)` - If the remote call fails
    pub async fn insert(&self, record: &IndexRecord) -> Result<(), SearchIndexError> {
        let object_id = Self::record_id(record)?;
        self.provider.save_object(record).await?;
        info!(object_id = %object_id, "Record inserted");
        Ok(())
    }

    /// Same upsert as [`SearchIndexService::insert`], for call sites handling changes.
    pub async fn update(&self, record: &IndexRecord) -> Result<(), SearchIndexError> {
        let object_id = Self::record_id(record)?;
        self.provider.save_object(record).await?;
        info!(object_id = %object_id, "Record updated");
        Ok(())
    }

    /// Delete a single record.
    ///
    /// If the record doesn't exist, the operation is considered successful.
    pub async fn delete(&self, object_id: &str) -> Result<(), SearchIndexError> {
        validate_object_id(object_id)?;
        self.provider.delete_object(object_id).await?;
        info!(object_id = %object_id, "Record deleted");
        Ok(())
    }

    /// Delete a record together with all of its descendants.
    ///
    /// Issues one delete per id, the page first and then the descendants in the
    /// given order, and keeps going after a failure.
    ///
    /// # Arguments
    ///
    /// * `object_id` - The page's record id
    /// * `descendant_ids` - Record ids of every page below it
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - If every delete succeeded
    /// * `Err(SearchIndexError::PartialFailure)` - Listing the removed and the remaining ids
    /// * `Err(SearchIndexError)` - If validation or the whole operation fails
    pub async fn delete_recursive(
        &self,
        object_id: &str,
        descendant_ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut ids = Vec::with_capacity(descendant_ids.len() + 1);
        ids.push(object_id.to_string());
        ids.extend(descendant_ids.iter().cloned());

        for id in &ids {
            validate_object_id(id)?;
        }

        let summary = self.provider.delete_objects(&ids).await?;

        if summary.failed > 0 {
            warn!(
                object_id = %object_id,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Recursive delete completed with failures"
            );
            return Err(SearchIndexError::partial_failure(
                "delete_recursive",
                summary.completed_ids(),
                summary.failed_steps(),
            ));
        }

        info!(
            object_id = %object_id,
            descendants = descendant_ids.len(),
            "Record and descendants deleted"
        );
        Ok(summary)
    }

    /// Re-key a record: delete it under its old id, then store the new record.
    ///
    /// There is no rollback. If the delete succeeds and the insert fails, the page
    /// is missing from the index until the next update or rebuild, and a
    /// `PartialFailure` naming the insert step is returned.
    ///
    /// # Arguments
    ///
    /// * `old_id` - The record id before the move
    /// * `record` - The record built from the moved page
    pub async fn move_record(
        &self,
        old_id: &str,
        record: &IndexRecord,
    ) -> Result<(), SearchIndexError> {
        validate_object_id(old_id)?;
        let new_id = Self::record_id(record)?;

        self.provider.delete_object(old_id).await?;
        debug!(old_id = %old_id, "Old record removed for move");

        if let Err(e) = self.provider.save_object(record).await {
            warn!(
                old_id = %old_id,
                new_id = %new_id,
                error = %e,
                "Moved record could not be stored; page is unindexed until the next sync"
            );
            return Err(SearchIndexError::partial_failure(
                "move",
                vec![format!("delete {}", old_id)],
                vec![FailedStep::new(format!("insert {}", new_id), e)],
            ));
        }

        info!(old_id = %old_id, new_id = %new_id, "Record moved");
        Ok(())
    }

    /// Replace the whole index with the indexable pages of the site tree.
    ///
    /// Records are written in batches into a scratch index which is then moved over
    /// the live index, so searches keep seeing the old contents until the swap. A
    /// site without indexable pages clears the live index instead.
    ///
    /// # Arguments
    ///
    /// * `pages` - Top-level pages of the site; descendants are included
    /// * `mapper` - Decides which pages are indexed and how they are mapped
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of records now in the index
    /// * `Err(SearchIndexError)` - If any step fails; the live index is then untouched
    pub async fn rebuild_full(
        &self,
        pages: &[Page],
        mapper: &DocumentMapper,
    ) -> Result<usize, SearchIndexError> {
        let records: Vec<IndexRecord> = Page::flatten(pages)
            .into_iter()
            .filter(|page| mapper.is_indexable(page))
            .map(|page| mapper.to_record(page))
            .collect();

        for record in &records {
            Self::record_id(record)?;
        }

        let live = self.provider.index_name().to_string();

        if records.is_empty() {
            self.provider.clear_index(&live).await?;
            info!(index = %live, "Index rebuilt empty");
            return Ok(0);
        }

        let scratch = format!("{}{}", live, self.config.temp_index_suffix);
        self.provider.clear_index(&scratch).await?;

        let batch_size = self.config.max_batch_size.unwrap_or(records.len()).max(1);
        for (batch, chunk) in records.chunks(batch_size).enumerate() {
            self.provider.save_objects(&scratch, chunk).await?;
            debug!(index = %scratch, batch = batch, count = chunk.len(), "Batch written");
        }

        self.provider.move_index(&scratch, &live).await?;

        info!(index = %live, count = records.len(), "Index rebuilt");
        Ok(records.len())
    }

    /// Number of records in the live index.
    pub async fn object_count(&self) -> Result<u64, SearchIndexError> {
        self.provider.object_count().await
    }

    /// Search the live index and decode one page of results.
    ///
    /// # Arguments
    ///
    /// * `query` - Query with a 1-based page number
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResultSet)` - The decoded page; its `page` is 1-based again
    /// * `Err(SearchIndexError::ValidationError)` - If the query is invalid
    /// * `Err(SearchIndexError)` - If the remote call fails
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResultSet, SearchIndexError> {
        query.validate().map_err(SearchIndexError::validation)?;
        let raw = self.provider.search(query).await?;
        let results = SearchResultSet::decode(&raw);
        debug!(
            query = %query.query,
            page = results.page,
            total = results.total_count,
            "Search completed"
        );
        Ok(results)
    }
}
