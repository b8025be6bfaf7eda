//! Inclusion filter expressions
//!
//! A filter is a small boolean expression tree evaluated once per run record.
//! Evaluation is pure: no I/O, no state, same answer for the same record.

use serde_json::{Map, Value};

use crate::shared::models::RunRecord;

/// Boolean expression over run-record fields
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Every child holds (vacuously true when empty)
    All(Vec<FilterExpr>),
    /// At least one child holds (false when empty)
    Any(Vec<FilterExpr>),
    /// The field is present (`present = true`) or absent (`present = false`)
    Exists { field: String, present: bool },
    /// The field value is one of `allowed`
    ///
    /// A missing field compares as `null`; an array value matches when any
    /// element is allowed. An empty allow-list never matches.
    In { field: String, allowed: Vec<Value> },
}

impl FilterExpr {
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
            present: true,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
            present: false,
        }
    }

    pub fn one_of<I, V>(field: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            field: field.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn evaluate(&self, record: &RunRecord) -> bool {
        match self {
            Self::All(children) => children.iter().all(|c| c.evaluate(record)),
            Self::Any(children) => children.iter().any(|c| c.evaluate(record)),
            Self::Exists { field, present } => record.contains(field) == *present,
            Self::In { field, allowed } => {
                let value = record.get(field).unwrap_or(&Value::Null);
                match value {
                    Value::Array(items) => {
                        allowed.contains(value) || items.iter().any(|i| allowed.contains(i))
                    }
                    _ => allowed.contains(value),
                }
            }
        }
    }

    /// Render back into the query-document dialect accepted by the parser
    pub fn to_query_value(&self) -> Value {
        match self {
            Self::All(children) => Value::Object(single("$and", branches(children))),
            Self::Any(children) => Value::Object(single("$or", branches(children))),
            Self::Exists { field, present } => Value::Object(single(
                field,
                Value::Object(single("$exists", Value::Bool(*present))),
            )),
            Self::In { field, allowed } => Value::Object(single(
                field,
                Value::Object(single("$in", Value::Array(allowed.clone()))),
            )),
        }
    }
}

fn branches(children: &[FilterExpr]) -> Value {
    Value::Array(children.iter().map(FilterExpr::to_query_value).collect())
}

fn single(key: &str, value: impl Into<Value>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value.into());
    map
}

/// Per-deployment eligibility predicate
///
/// The default (no conditions) accepts every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InclusionFilter {
    root: Option<FilterExpr>,
}

impl InclusionFilter {
    pub fn accept_all() -> Self {
        Self { root: None }
    }

    pub fn new(root: FilterExpr) -> Self {
        Self { root: Some(root) }
    }

    pub fn root(&self) -> Option<&FilterExpr> {
        self.root.as_ref()
    }

    pub fn is_accept_all(&self) -> bool {
        self.root.is_none()
    }

    pub fn accepts(&self, record: &RunRecord) -> bool {
        self.root.as_ref().map_or(true, |expr| expr.evaluate(record))
    }

    /// Query-document form (`{}` when there are no conditions)
    pub fn to_query_value(&self) -> Value {
        self.root
            .as_ref()
            .map_or_else(|| Value::Object(Map::new()), FilterExpr::to_query_value)
    }
}
