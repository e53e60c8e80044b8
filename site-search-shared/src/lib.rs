//! # Site Search Shared
//!
//! This crate defines the data structures shared across the site search
//! synchronizer: CMS pages as the sync layer sees them, the flat records sent
//! to the hosted index, the mapper between the two, and the decoded search
//! result set.

pub mod mapper;
pub mod types;

pub use mapper::{to_record, DocumentMapper};
pub use types::index_record::{FieldValue, IndexRecord, ID_FIELD};
pub use types::page::Page;
pub use types::search_query::SearchQuery;
pub use types::search_result::SearchResultSet;
