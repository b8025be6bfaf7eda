//! Field-type declarations sent with `put_schema`
//!
//! ```text
//! {"properties": {
//!     "time": {"type": "date", "format": "epoch_second"},
//!     "date": {"type": "date", "format": "strict_date_optional_time"}
//! }}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// Seconds since the POSIX epoch
    EpochSecond,
    /// ISO 8601 with optional time part
    StrictDateOptionalTime,
}

impl DateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::EpochSecond => "epoch_second",
            DateFormat::StrictDateOptionalTime => "strict_date_optional_time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FieldKind {
    Date { format: DateFormat },
    Keyword,
    Text,
    Long,
    Double,
    Boolean,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Date { .. } => "date",
            FieldKind::Keyword => "keyword",
            FieldKind::Text => "text",
            FieldKind::Long => "long",
            FieldKind::Double => "double",
            FieldKind::Boolean => "boolean",
        }
    }

    fn to_value(self) -> Value {
        match self {
            FieldKind::Date { format } => json!({"type": "date", "format": format.as_str()}),
            other => json!({"type": other.as_str()}),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub field: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDeclaration {
    pub fn new(field: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// Ordered set of field declarations; at most one per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSchema {
    fields: Vec<FieldDeclaration>,
}

impl IndexSchema {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `time` as epoch seconds and `date` as ISO text
    pub fn run_defaults() -> Self {
        Self::empty()
            .with_field(FieldDeclaration::new(
                "time",
                FieldKind::Date {
                    format: DateFormat::EpochSecond,
                },
            ))
            .with_field(FieldDeclaration::new(
                "date",
                FieldKind::Date {
                    format: DateFormat::StrictDateOptionalTime,
                },
            ))
    }

    /// Add a declaration, replacing any earlier one for the same field
    pub fn with_field(mut self, declaration: FieldDeclaration) -> Self {
        match self.fields.iter_mut().find(|d| d.field == declaration.field) {
            Some(existing) => *existing = declaration,
            None => self.fields.push(declaration),
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldKind> {
        self.fields
            .iter()
            .find(|d| d.field == field)
            .map(|d| &d.kind)
    }

    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Request body for the index's mapping endpoint
    pub fn to_mapping_body(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|d| (d.field.clone(), d.kind.to_value()))
            .collect();
        json!({ "properties": properties })
    }
}
