//! Run records and normalized index documents
//!
//! Both are thin wrappers around a JSON object. A `RunRecord` is what the run
//! engine hands over when a run completes; a `NormalizedDocument` is the subset
//! of it that survives the document map and is written to the index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unique run identifier (the record's `uid`).
/// Example: `6b1e1e6c-3f0a-4b8e-9d7c-1f2a3b4c5d6e`
pub type RecordId = String;

// ═══════════════════════════════════════════════════════════════════════════
// RunRecord
// ═══════════════════════════════════════════════════════════════════════════

/// Metadata of one completed experiment run
///
/// Immutable once received: there are no mutating accessors.
///
/// # Examples
///
/// ```rust
/// use brokersearch::RunRecord;
/// use serde_json::json;
///
/// let record = RunRecord::from_value(json!({"uid": "abc", "time": 1609459200.0})).unwrap();
/// assert_eq!(record.identifier("uid").as_deref(), Some("abc"));
/// assert!(record.contains("time"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunRecord {
    fields: Map<String, Value>,
}

impl RunRecord {
    /// Wrap an existing JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a record from a JSON value; `None` unless the value is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Raw field value (a present JSON `null` is returned as `Some(Value::Null)`)
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Identifier stored under `field`, rendered as a string
    ///
    /// Strings are returned as-is and integers in decimal form. Any other
    /// shape is not a usable document key and yields `None`.
    pub fn identifier(&self, field: &str) -> Option<RecordId> {
        match self.fields.get(field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl FromIterator<(String, Value)> for RunRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// NormalizedDocument
// ═══════════════════════════════════════════════════════════════════════════

/// Converted subset of a run record destined for the index
///
/// Holds only fields whose converter produced a value. Built fresh for every
/// synchronization and discarded once inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedDocument {
    fields: Map<String, Value>,
}

impl NormalizedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field`, returning the value it replaced
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_non_object_is_none() {
        assert!(RunRecord::from_value(json!([1, 2])).is_none());
        assert!(RunRecord::from_value(json!("uid")).is_none());
    }

    #[test]
    fn test_record_identifier_shapes() {
        let record = RunRecord::from_value(json!({
            "uid": "abc123",
            "scan_id": 42,
            "time": 1.5,
            "empty": "",
            "nothing": null
        }))
        .unwrap();

        assert_eq!(record.identifier("uid").as_deref(), Some("abc123"));
        assert_eq!(record.identifier("scan_id").as_deref(), Some("42"));
        assert_eq!(record.identifier("time"), None);
        assert_eq!(record.identifier("empty"), None);
        assert_eq!(record.identifier("nothing"), None);
        assert_eq!(record.identifier("missing"), None);
    }

    #[test]
    fn test_record_present_null_is_distinct_from_missing() {
        let record = RunRecord::from_value(json!({"comment": null})).unwrap();
        assert_eq!(record.get("comment"), Some(&Value::Null));
        assert_eq!(record.get("other"), None);
        assert!(record.contains("comment"));
    }

    #[test]
    fn test_record_serde_transparent() {
        let record: RunRecord = serde_json::from_str(r#"{"uid": "u1", "cycle": "2"}"#).unwrap();
        assert_eq!(record.len(), 2);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({"uid": "u1", "cycle": "2"}));
    }

    #[test]
    fn test_document_insert_overwrites() {
        let mut doc = NormalizedDocument::new();
        assert_eq!(doc.insert("pi", json!("Billinge")), None);
        assert_eq!(doc.insert("pi", json!("Bozin")), Some(json!("Billinge")));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.into_value(), json!({"pi": "Bozin"}));
    }
}
