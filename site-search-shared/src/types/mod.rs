//! This module defines the core data structures used across the site search
//! synchronizer. It re-exports `Page`, `IndexRecord` and `SearchResultSet`.

pub mod index_record;
pub mod page;
pub mod search_query;
pub mod search_result;

pub use index_record::{FieldValue, IndexRecord};
pub use page::Page;
pub use search_query::SearchQuery;
pub use search_result::SearchResultSet;
