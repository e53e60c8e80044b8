//! Hosted search provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! on top of the hosted index's REST API, using `reqwest`.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::algolia::config::AlgoliaConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::utils::{self, encode_search_params};
use site_search_shared::{IndexRecord, SearchQuery};

const APPLICATION_ID_HEADER: &str = "X-Algolia-Application-Id";
const API_KEY_HEADER: &str = "X-Algolia-API-Key";

/// Hosted search provider implementation.
///
/// Every call is a single authenticated HTTPS request; nothing is retried.
///
/// # Example
///
/// ```ignore
/// use site_search_repository::algolia::{AlgoliaConfig, AlgoliaProvider};
/// use site_search_shared::IndexRecord;
///
/// let config = AlgoliaConfig::new("APP_ID", "API_KEY", "pages");
/// let provider = AlgoliaProvider::new(config)?;
///
/// let record = IndexRecord::with_id("blog/hello").with("title", "Hello");
/// // This will create the record if it doesn't exist, or replace it if it does
/// provider.save_object(&record).await?;
/// ```
pub struct AlgoliaProvider {
    client: Client,
    config: AlgoliaConfig,
    write_host: Url,
    read_host: Url,
}

impl AlgoliaProvider {
    /// Create a new provider for the configured application and index.
    ///
    /// # Arguments
    ///
    /// * `config` - Credentials, index name and optional host override
    ///
    /// # Returns
    ///
    /// * `Ok(AlgoliaProvider)` - A new provider instance
    /// * `Err(SearchIndexError::ConfigurationError)` - If the configuration is incomplete
    pub fn new(config: AlgoliaConfig) -> Result<Self, SearchIndexError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchIndexError::configuration(e.to_string()))?;

        let write_host = config.write_host()?;
        let read_host = config.read_host()?;

        info!(
            app_id = %config.app_id,
            index = %config.index,
            write_host = %write_host,
            "Created hosted search provider"
        );

        Ok(Self {
            client,
            config,
            write_host,
            read_host,
        })
    }

    /// Build an endpoint URL under `/1/` from path segments.
    ///
    /// Segments are percent-encoded individually, so record ids containing
    /// `/` stay a single segment.
    fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SearchIndexError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SearchIndexError::configuration(format!("host '{}' cannot be a base", base))
            })?
            .pop_if_empty()
            .push("1")
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(APPLICATION_ID_HEADER, &self.config.app_id)
            .header(API_KEY_HEADER, &self.config.api_key)
    }

    /// Send a request, mapping transport failures through [`transport_error`].
    async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<Response, SearchIndexError> {
        self.authorized(request).send().await.map_err(|e| {
            error!(operation = operation, error = %e, "Request to search index failed");
            transport_error(operation, &e)
        })
    }

    /// Attach `body` as a JSON payload.
    fn with_json<T: Serialize + ?Sized>(
        request: RequestBuilder,
        body: &T,
        operation: &str,
    ) -> Result<RequestBuilder, SearchIndexError> {
        let bytes = encode_json(body, operation)?;
        Ok(request.header(CONTENT_TYPE, "application/json").body(bytes))
    }

    /// Turn a non-success status into `RemoteError`, optionally tolerating 404.
    async fn check_status(
        response: Response,
        operation: &str,
        allow_not_found: bool,
    ) -> Result<Response, SearchIndexError> {
        let status = response.status();
        if accepts(status, allow_not_found) {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(
            operation = operation,
            status = %status,
            body = %error_body,
            "Search index request failed"
        );
        Err(SearchIndexError::remote(
            operation,
            status.as_u16(),
            error_message(&error_body),
        ))
    }

    async fn json_body(response: Response, operation: &str) -> Result<Value, SearchIndexError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(format!("{} response: {}", operation, e)))
    }

    fn record_id(record: &IndexRecord) -> Result<String, SearchIndexError> {
        let object_id = record
            .id()
            .ok_or_else(|| SearchIndexError::validation("record has no objectID"))?;
        utils::validate_object_id(&object_id)?;
        Ok(object_id)
    }

    /// Body of a batch request replacing every given record.
    fn batch_body(records: &[IndexRecord]) -> Result<Value, SearchIndexError> {
        let requests = records
            .iter()
            .map(|record| {
                Self::record_id(record)?;
                Ok(json!({
                    "action": "updateObject",
                    "body": record.to_json(),
                }))
            })
            .collect::<Result<Vec<_>, SearchIndexError>>()?;
        Ok(json!({ "requests": requests }))
    }

    /// Find the record count of `index` in a list-indexes response.
    fn entries_for(listing: &Value, index: &str) -> Result<u64, SearchIndexError> {
        let items = listing
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchIndexError::parse("index listing has no items array"))?;

        Ok(items
            .iter()
            .find(|item| item.get("name").and_then(Value::as_str) == Some(index))
            .and_then(|item| item.get("entries"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

fn encode_json<T: Serialize + ?Sized>(
    body: &T,
    operation: &str,
) -> Result<Vec<u8>, SearchIndexError> {
    serde_json::to_vec(body).map_err(|e| {
        SearchIndexError::serialization(format!("{} request body: {}", operation, e))
    })
}

/// Classify a failure that produced no response.
fn transport_error(operation: &str, e: &reqwest::Error) -> SearchIndexError {
    if e.is_timeout() {
        SearchIndexError::connection(format!("{} timed out: {}", operation, e))
    } else if e.is_connect() || e.is_request() {
        SearchIndexError::connection(format!("{} failed: {}", operation, e))
    } else if e.is_builder() {
        SearchIndexError::configuration(format!("{} request is invalid: {}", operation, e))
    } else {
        SearchIndexError::unknown(format!("{} failed: {}", operation, e))
    }
}

/// Whether a response status counts as success.
///
/// Deletes and clears pass `allow_not_found`, since a missing record or index
/// already is the desired end state.
fn accepts(status: StatusCode, allow_not_found: bool) -> bool {
    status.is_success() || (allow_not_found && status == StatusCode::NOT_FOUND)
}

/// Pull the `message` field out of an error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl SearchIndexProvider for AlgoliaProvider {
    fn index_name(&self) -> &str {
        &self.config.index
    }

    /// Create or replace a record (`PUT /1/indexes/{index}/{objectID}`).
    async fn save_object(&self, record: &IndexRecord) -> Result<(), SearchIndexError> {
        let object_id = Self::record_id(record)?;
        let url = Self::endpoint(
            &self.write_host,
            &["indexes", self.config.index.as_str(), object_id.as_str()],
        )?;

        let response = self
            .send(
                Self::with_json(self.client.put(url), &record.to_json(), "save_object")?,
                "save_object",
            )
            .await?;
        Self::check_status(response, "save_object", false).await?;

        debug!(object_id = %object_id, "Record saved");
        Ok(())
    }

    /// Delete a record (`DELETE /1/indexes/{index}/{objectID}`).
    ///
    /// A 404 means the record is already gone and is treated as success.
    async fn delete_object(&self, object_id: &str) -> Result<(), SearchIndexError> {
        utils::validate_object_id(object_id)?;
        let url = Self::endpoint(
            &self.write_host,
            &["indexes", self.config.index.as_str(), object_id],
        )?;

        let response = self
            .send(self.client.delete(url), "delete_object")
            .await?;
        let response = Self::check_status(response, "delete_object", true).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(object_id = %object_id, "Record already absent");
        } else {
            debug!(object_id = %object_id, "Record deleted");
        }
        Ok(())
    }

    /// Replace many records with one request (`POST /1/indexes/{index}/batch`).
    async fn save_objects(
        &self,
        index: &str,
        records: &[IndexRecord],
    ) -> Result<(), SearchIndexError> {
        if records.is_empty() {
            return Ok(());
        }

        let body = Self::batch_body(records)?;
        let url = Self::endpoint(&self.write_host, &["indexes", index, "batch"])?;

        let response = self
            .send(
                Self::with_json(self.client.post(url), &body, "save_objects")?,
                "save_objects",
            )
            .await?;
        Self::check_status(response, "save_objects", false).await?;

        debug!(index = %index, count = records.len(), "Batch saved");
        Ok(())
    }

    /// Remove all records (`POST /1/indexes/{index}/clear`).
    async fn clear_index(&self, index: &str) -> Result<(), SearchIndexError> {
        let url = Self::endpoint(&self.write_host, &["indexes", index, "clear"])?;

        let response = self
            .send(self.client.post(url), "clear_index")
            .await?;
        Self::check_status(response, "clear_index", true).await?;

        debug!(index = %index, "Index cleared");
        Ok(())
    }

    /// Move `source` over `destination` (`POST /1/indexes/{source}/operation`).
    async fn move_index(&self, source: &str, destination: &str) -> Result<(), SearchIndexError> {
        let url = Self::endpoint(&self.write_host, &["indexes", source, "operation"])?;
        let body = json!({
            "operation": "move",
            "destination": destination,
        });

        let response = self
            .send(
                Self::with_json(self.client.post(url), &body, "move_index")?,
                "move_index",
            )
            .await?;
        Self::check_status(response, "move_index", false).await?;

        info!(source = %source, destination = %destination, "Index moved");
        Ok(())
    }

    /// Query the live index (`POST /1/indexes/{index}/query`).
    async fn search(&self, query: &SearchQuery) -> Result<Value, SearchIndexError> {
        let url = Self::endpoint(
            &self.read_host,
            &["indexes", self.config.index.as_str(), "query"],
        )?;
        let body = json!({ "params": encode_search_params(query) });

        let response = self
            .send(
                Self::with_json(self.client.post(url), &body, "search")?,
                "search",
            )
            .await?;
        let response = Self::check_status(response, "search", false).await?;

        Self::json_body(response, "search").await
    }

    /// Read the record count from the index listing (`GET /1/indexes`).
    ///
    /// An index that has never been written to is not listed and counts as empty.
    async fn object_count(&self) -> Result<u64, SearchIndexError> {
        let url = Self::endpoint(&self.read_host, &["indexes"])?;

        let response = self
            .send(self.client.get(url), "object_count")
            .await?;
        let response = Self::check_status(response, "object_count", false).await?;
        let listing = Self::json_body(response, "object_count").await?;

        Self::entries_for(&listing, &self.config.index)
    }
}
