//! In-memory search index provider for testing and local development.
//!
//! The `InMemoryProvider` keeps every index in process memory, records each
//! call it receives, and can be told to fail writes for chosen record ids or
//! to behave as if the backend were unreachable.
//!
//! # Example
//!
//! ```ignore
//! use site_search_repository::{InMemoryProvider, SearchIndexProvider};
//! use site_search_shared::IndexRecord;
//!
//! let provider = InMemoryProvider::new("pages");
//! provider.save_object(&IndexRecord::with_id("home")).await?;
//! assert_eq!(provider.len(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::utils::{self, encode_search_params};
use site_search_shared::types::search_result::DEFAULT_HITS_PER_PAGE;
use site_search_shared::{FieldValue, IndexRecord, SearchQuery};

/// A call received by the in-memory provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Save(String),
    Delete(String),
    SaveBatch { index: String, count: usize },
    Clear(String),
    Move { source: String, destination: String },
    Search(String),
    Count,
}

type Index = IndexMap<String, IndexRecord>;

/// In-memory provider that behaves like the hosted index.
pub struct InMemoryProvider {
    index_name: String,
    indexes: RwLock<HashMap<String, Index>>,
    calls: Mutex<Vec<ProviderCall>>,
    failing_ids: RwLock<HashSet<String>>,
    offline: AtomicBool,
}

impl InMemoryProvider {
    /// Create an empty provider whose live index is `index_name`.
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            indexes: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing_ids: RwLock::new(HashSet::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Create a provider whose live index already holds `records`.
    pub fn with_records(index_name: impl Into<String>, records: Vec<IndexRecord>) -> Self {
        let provider = Self::new(index_name);
        {
            let mut indexes = provider.indexes.write().unwrap_or_else(PoisonError::into_inner);
            let live = indexes.entry(provider.index_name.clone()).or_default();
            for record in records {
                if let Some(id) = record.id() {
                    live.insert(id, record);
                }
            }
        }
        provider
    }

    /// Make every save or delete of `object_id` fail with a remote error.
    pub fn fail_writes_for(&self, object_id: impl Into<String>) {
        self.failing_ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(object_id.into());
    }

    /// Make every call fail with a connection error while `offline` is true.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Records of the live index, in insertion order.
    pub fn records(&self) -> Vec<IndexRecord> {
        self.records_in(&self.index_name)
    }

    /// Records of any index, in insertion order.
    pub fn records_in(&self, index: &str) -> Vec<IndexRecord> {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up a record of the live index.
    pub fn get(&self, object_id: &str) -> Option<IndexRecord> {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.index_name)
            .and_then(|records| records.get(object_id).cloned())
    }

    /// Number of records in the live index.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an index with this name exists.
    pub fn has_index(&self, index: &str) -> bool {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(index)
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Identifiers passed to delete calls, in order.
    pub fn deleted_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Identifiers passed to single-record save calls, in order.
    pub fn saved_ids(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Save(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record_call(&self, call: ProviderCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn check_online(&self, operation: &str) -> Result<(), SearchIndexError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SearchIndexError::connection(format!(
                "{} failed: backend unreachable",
                operation
            )));
        }
        Ok(())
    }

    fn check_writable(&self, object_id: &str, operation: &str) -> Result<(), SearchIndexError> {
        if self
            .failing_ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(object_id)
        {
            return Err(SearchIndexError::remote(
                operation,
                500,
                format!("injected failure for {}", object_id),
            ));
        }
        Ok(())
    }

    fn matches(record: &IndexRecord, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        record.iter().any(|(_, value)| match value {
            FieldValue::String(s) => s.to_lowercase().contains(needle),
            _ => false,
        })
    }
}

#[async_trait]
impl SearchIndexProvider for InMemoryProvider {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn save_object(&self, record: &IndexRecord) -> Result<(), SearchIndexError> {
        let object_id = record
            .id()
            .ok_or_else(|| SearchIndexError::validation("record has no objectID"))?;
        self.record_call(ProviderCall::Save(object_id.clone()));
        self.check_online("save_object")?;
        utils::validate_object_id(&object_id)?;
        self.check_writable(&object_id, "save_object")?;

        self.indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(self.index_name.clone())
            .or_default()
            .insert(object_id, record.clone());
        Ok(())
    }

    async fn delete_object(&self, object_id: &str) -> Result<(), SearchIndexError> {
        self.record_call(ProviderCall::Delete(object_id.to_string()));
        self.check_online("delete_object")?;
        utils::validate_object_id(object_id)?;
        self.check_writable(object_id, "delete_object")?;

        if let Some(records) = self
            .indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&self.index_name)
        {
            records.shift_remove(object_id);
        }
        Ok(())
    }

    async fn save_objects(
        &self,
        index: &str,
        records: &[IndexRecord],
    ) -> Result<(), SearchIndexError> {
        self.record_call(ProviderCall::SaveBatch {
            index: index.to_string(),
            count: records.len(),
        });
        self.check_online("save_objects")?;

        let mut keyed = Vec::with_capacity(records.len());
        for record in records {
            let object_id = record
                .id()
                .ok_or_else(|| SearchIndexError::validation("record has no objectID"))?;
            utils::validate_object_id(&object_id)?;
            self.check_writable(&object_id, "save_objects")?;
            keyed.push((object_id, record.clone()));
        }

        let mut indexes = self.indexes.write().unwrap_or_else(PoisonError::into_inner);
        let target = indexes.entry(index.to_string()).or_default();
        target.extend(keyed);
        Ok(())
    }

    async fn clear_index(&self, index: &str) -> Result<(), SearchIndexError> {
        self.record_call(ProviderCall::Clear(index.to_string()));
        self.check_online("clear_index")?;

        if let Some(records) = self
            .indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(index)
        {
            records.clear();
        }
        Ok(())
    }

    async fn move_index(&self, source: &str, destination: &str) -> Result<(), SearchIndexError> {
        self.record_call(ProviderCall::Move {
            source: source.to_string(),
            destination: destination.to_string(),
        });
        self.check_online("move_index")?;

        let mut indexes = self.indexes.write().unwrap_or_else(PoisonError::into_inner);
        let records = indexes.remove(source).ok_or_else(|| {
            SearchIndexError::remote("move_index", 404, format!("index {} does not exist", source))
        })?;
        indexes.insert(destination.to_string(), records);
        Ok(())
    }

    /// Case-insensitive substring match over string attributes, paginated
    /// and shaped like the hosted index's response.
    async fn search(&self, query: &SearchQuery) -> Result<Value, SearchIndexError> {
        self.record_call(ProviderCall::Search(query.query.clone()));
        self.check_online("search")?;

        let needle = query.query.to_lowercase();
        let matching: Vec<IndexRecord> = self
            .records()
            .into_iter()
            .filter(|record| Self::matches(record, &needle))
            .collect();

        let hits_per_page = query
            .hits_per_page
            .map(u64::from)
            .unwrap_or(DEFAULT_HITS_PER_PAGE);
        let page = u64::from(query.service_page());
        let total = matching.len() as u64;
        let hits: Vec<Value> = matching
            .iter()
            .skip((page * hits_per_page) as usize)
            .take(hits_per_page as usize)
            .map(IndexRecord::to_json)
            .collect();

        Ok(json!({
            "hits": hits,
            "page": page,
            "nbHits": total,
            "nbPages": total.div_ceil(hits_per_page.max(1)),
            "hitsPerPage": hits_per_page,
            "processingTimeMS": 0,
            "query": query.query,
            "params": encode_search_params(query),
        }))
    }

    async fn object_count(&self) -> Result<u64, SearchIndexError> {
        self.record_call(ProviderCall::Count);
        self.check_online("object_count")?;
        Ok(self.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_is_upsert() {
        let provider = InMemoryProvider::new("pages");
        let record = IndexRecord::with_id("home").with("title", "Home");

        provider.save_object(&record).await.unwrap();
        provider.save_object(&record).await.unwrap();

        assert_eq!(provider.len(), 1);
        assert_eq!(provider.get("home"), Some(record));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let provider = InMemoryProvider::new("pages");
        provider.delete_object("nope").await.unwrap();
        assert_eq!(provider.deleted_ids(), vec!["nope"]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let provider = InMemoryProvider::new("pages");
        provider.fail_writes_for("broken");

        let err = provider.delete_object("broken").await.unwrap_err();
        assert!(matches!(err, SearchIndexError::RemoteError { status: 500, .. }));

        provider.set_offline(true);
        let err = provider.object_count().await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_delete_objects_reports_each_id() {
        let provider = InMemoryProvider::with_records(
            "pages",
            vec![IndexRecord::with_id("a"), IndexRecord::with_id("b")],
        );
        provider.fail_writes_for("b");

        let summary = provider
            .delete_objects(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(provider.get("a").is_none());
        assert!(provider.get("b").is_some());
    }

    #[tokio::test]
    async fn test_move_index_replaces_destination() {
        let provider = InMemoryProvider::with_records("pages", vec![IndexRecord::with_id("old")]);
        provider
            .save_objects("pages_tmp", &[IndexRecord::with_id("new")])
            .await
            .unwrap();

        provider.move_index("pages_tmp", "pages").await.unwrap();

        assert!(!provider.has_index("pages_tmp"));
        assert_eq!(provider.records(), vec![IndexRecord::with_id("new")]);
    }

    #[tokio::test]
    async fn test_search_paginates() {
        let records = (0..25)
            .map(|i| IndexRecord::with_id(format!("p{}", i)).with("title", format!("Post {}", i)))
            .collect();
        let provider = InMemoryProvider::with_records("pages", records);

        let raw = provider
            .search(&SearchQuery::new("post").with_page(2))
            .await
            .unwrap();

        assert_eq!(raw["page"], 1);
        assert_eq!(raw["nbHits"], 25);
        assert_eq!(raw["hits"].as_array().unwrap().len(), 5);
        assert_eq!(raw["params"], "query=post&page=1");
    }
}
