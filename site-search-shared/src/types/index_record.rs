//! Index record types for the search index.
//!
//! An `IndexRecord` is the flat attribute bag that is written to the hosted
//! index and returned from it as a search hit. Keys are kept in insertion
//! order so records read back in the order the provider sent them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Name of the identifier attribute understood by the hosted index.
pub const ID_FIELD: &str = "objectID";

/// A single attribute value inside an `IndexRecord`.
///
/// Scalars cover everything the mapper writes. `Nested` keeps arrays and
/// objects returned by the provider (highlighting, snippets, ranking info)
/// without the decoder knowing their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Nested(Value),
}

impl FieldValue {
    /// Returns the string slice if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integral number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Returns the value as `f64` if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert back into a plain JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Nested(v) => v.clone(),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::String(s),
            nested @ (Value::Array(_) | Value::Object(_)) => FieldValue::Nested(nested),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<f64> for FieldValue {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Null)
    }
}

/// Flat, ordered attribute bag sent to and returned from the search index.
///
/// Records are derived and ephemeral: they are rebuilt from the source page on
/// every sync call and never stored locally. The `objectID` attribute carries
/// the page identifier, which makes repeated writes of the same page an
/// overwrite rather than a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexRecord {
    fields: IndexMap<String, FieldValue>,
}

impl IndexRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record that only carries its identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.insert(ID_FIELD, id.into());
        record
    }

    /// Build a record from a JSON object, keeping every attribute.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        Self {
            fields: object
                .iter()
                .map(|(key, value)| (key.clone(), FieldValue::from(value.clone())))
                .collect(),
        }
    }

    /// The record identifier, if the record carries a string `objectID`.
    ///
    /// Numeric identifiers returned by the provider are rendered as strings.
    pub fn id(&self) -> Option<String> {
        match self.fields.get(ID_FIELD)? {
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Set an attribute, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`IndexRecord::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Convenience accessor for string attributes.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render the record as a JSON object body.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}
