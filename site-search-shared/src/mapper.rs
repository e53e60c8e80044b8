//! Page to index record mapping.
//!
//! Turns a CMS page into the flat record written to the hosted index. Mapping
//! is pure: the same page always yields the same record, and optional values
//! that are absent are written as empty strings.

use crate::types::index_record::{FieldValue, IndexRecord};
use crate::types::page::Page;

/// Content field indexed when no field list is configured.
pub const DEFAULT_FIELD: &str = "text";

/// Maps pages to index records.
///
/// Holds the list of searchable content fields copied into each record and
/// the optional template allow-list that decides which pages are indexed at
/// all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMapper {
    fields: Vec<String>,
    templates: Vec<String>,
}

impl Default for DocumentMapper {
    fn default() -> Self {
        Self {
            fields: vec![DEFAULT_FIELD.to_string()],
            templates: Vec::new(),
        }
    }
}

impl DocumentMapper {
    /// Create a mapper.
    ///
    /// # Arguments
    ///
    /// * `fields` - Content fields copied into each record
    /// * `templates` - Templates whose pages are indexed; empty means all
    pub fn new(fields: Vec<String>, templates: Vec<String>) -> Self {
        Self { fields, templates }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Whether the page belongs in the index under the template allow-list.
    pub fn is_indexable(&self, page: &Page) -> bool {
        if self.templates.is_empty() {
            return true;
        }
        page.template
            .as_deref()
            .is_some_and(|template| self.templates.iter().any(|t| t == template))
    }

    /// Build the index record for a page.
    ///
    /// The record's `objectID` is always the page id. Content fields named in
    /// the field list never override the base attributes.
    pub fn to_record(&self, page: &Page) -> IndexRecord {
        let mut record = IndexRecord::with_id(page.id.clone());
        record.insert("url", text(page.url.as_deref()));
        record.insert("uri", page.id.clone());
        record.insert("title", text(page.title.as_deref()));
        record.insert("template", text(page.template.as_deref()));
        record.insert("visible", page.visible);
        record.insert(
            "num",
            page.num.map(FieldValue::from).unwrap_or_else(empty),
        );
        record.insert(
            "modified",
            page.modified
                .map(|ts| FieldValue::from(ts.timestamp()))
                .unwrap_or_else(empty),
        );

        for field in &self.fields {
            if record.contains_key(field) {
                continue;
            }
            record.insert(field.clone(), text(page.field(field)));
        }

        record
    }
}

/// Map a page with the default mapper (all templates, `text` field).
pub fn to_record(page: &Page) -> IndexRecord {
    DocumentMapper::default().to_record(page)
}

fn text(value: Option<&str>) -> FieldValue {
    FieldValue::from(value.unwrap_or_default())
}

fn empty() -> FieldValue {
    FieldValue::String(String::new())
}
