//! Query-document parser
//!
//! Accepted dialect (a subset of the document-store query language):
//!
//! ```text
//! {}                                   accept all
//! {"$or":  [<q>, ...]}                 any
//! {"$and": [<q>, ...]}                 all
//! {"<field>": {"$exists": <bool>}}     presence test
//! {"<field>": {"$in": [<v>, ...]}}     membership
//! {"<field>": {"$eq": <v>}}            equality (membership of one)
//! {"<field>": <scalar or array>}       implicit equality
//! ```
//!
//! Several keys in one object are combined with AND, as are several operators
//! under one field.

use serde_json::{Map, Value};
use thiserror::Error;

use super::expression::{FilterExpr, InclusionFilter};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("filter at '{path}' must be an object")]
    NotAnObject { path: String },

    #[error("unsupported operator '{operator}' at '{path}'")]
    UnsupportedOperator { path: String, operator: String },

    #[error("'{operator}' at '{path}' expects {expected}")]
    InvalidOperand {
        path: String,
        operator: String,
        expected: &'static str,
    },
}

impl InclusionFilter {
    /// Parse a query document
    ///
    /// # Errors
    ///
    /// `FilterParseError` when the document uses anything outside the dialect.
    pub fn parse(query: &Value) -> Result<Self, FilterParseError> {
        let object = query.as_object().ok_or_else(|| FilterParseError::NotAnObject {
            path: "$".to_string(),
        })?;

        if object.is_empty() {
            return Ok(Self::accept_all());
        }

        parse_object(object, "$").map(Self::new)
    }
}

fn parse_object(object: &Map<String, Value>, path: &str) -> Result<FilterExpr, FilterParseError> {
    let mut clauses = Vec::with_capacity(object.len());

    for (key, value) in object {
        let here = format!("{path}.{key}");
        let clause = match key.as_str() {
            "$or" => FilterExpr::Any(parse_branches(key, value, &here)?),
            "$and" => FilterExpr::All(parse_branches(key, value, &here)?),
            op if op.starts_with('$') => {
                return Err(FilterParseError::UnsupportedOperator {
                    path: path.to_string(),
                    operator: op.to_string(),
                })
            }
            field => parse_field(field, value, &here)?,
        };
        clauses.push(clause);
    }

    Ok(collapse(clauses))
}

fn parse_branches(
    operator: &str,
    value: &Value,
    path: &str,
) -> Result<Vec<FilterExpr>, FilterParseError> {
    let invalid = || FilterParseError::InvalidOperand {
        path: path.to_string(),
        operator: operator.to_string(),
        expected: "a non-empty array of objects",
    };

    let branches = value.as_array().filter(|a| !a.is_empty()).ok_or_else(invalid)?;

    branches
        .iter()
        .enumerate()
        .map(|(i, branch)| {
            let object = branch.as_object().ok_or_else(invalid)?;
            parse_object(object, &format!("{path}[{i}]"))
        })
        .collect()
}

fn parse_field(field: &str, value: &Value, path: &str) -> Result<FilterExpr, FilterParseError> {
    let operators = match value {
        Value::Object(map) if map.keys().any(|k| k.starts_with('$')) => map,
        other => return Ok(FilterExpr::one_of(field, [other.clone()])),
    };

    let mut clauses = Vec::with_capacity(operators.len());
    for (operator, operand) in operators {
        let clause = match operator.as_str() {
            "$exists" => {
                let present = operand.as_bool().ok_or_else(|| FilterParseError::InvalidOperand {
                    path: path.to_string(),
                    operator: operator.clone(),
                    expected: "a boolean",
                })?;
                FilterExpr::Exists {
                    field: field.to_string(),
                    present,
                }
            }
            "$in" => {
                let allowed = operand.as_array().ok_or_else(|| FilterParseError::InvalidOperand {
                    path: path.to_string(),
                    operator: operator.clone(),
                    expected: "an array",
                })?;
                FilterExpr::one_of(field, allowed.iter().cloned())
            }
            "$eq" => FilterExpr::one_of(field, [operand.clone()]),
            other => {
                return Err(FilterParseError::UnsupportedOperator {
                    path: path.to_string(),
                    operator: other.to_string(),
                })
            }
        };
        clauses.push(clause);
    }

    Ok(collapse(clauses))
}

fn collapse(mut clauses: Vec<FilterExpr>) -> FilterExpr {
    if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        FilterExpr::All(clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::RunRecord;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> RunRecord {
        RunRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_empty_is_accept_all() {
        let filter = InclusionFilter::parse(&json!({})).unwrap();
        assert!(filter.is_accept_all());
    }

    #[test]
    fn test_parse_or_of_exists_and_in() {
        let query = json!({"$or": [
            {"bt_piLast": {"$exists": false}},
            {"bt_piLast": {"$in": ["Billinge", "Bozin"]}}
        ]});
        let filter = InclusionFilter::parse(&query).unwrap();

        assert_eq!(
            filter.root(),
            Some(&FilterExpr::Any(vec![
                FilterExpr::missing("bt_piLast"),
                FilterExpr::one_of("bt_piLast", ["Billinge", "Bozin"]),
            ]))
        );
        assert!(filter.accepts(&record(json!({"uid": "u"}))));
        assert!(filter.accepts(&record(json!({"bt_piLast": "Bozin"}))));
        assert!(!filter.accepts(&record(json!({"bt_piLast": "Smith"}))));
        assert_eq!(filter.to_query_value(), query);
    }

    #[test]
    fn test_parse_implicit_equality_and_multiple_keys() {
        let filter = InclusionFilter::parse(&json!({"group": "xpd", "dark_frame": false})).unwrap();
        assert!(filter.accepts(&record(json!({"group": "xpd", "dark_frame": false}))));
        assert!(!filter.accepts(&record(json!({"group": "xpd", "dark_frame": true}))));
        assert!(!filter.accepts(&record(json!({"group": "iss", "dark_frame": false}))));
    }

    #[test]
    fn test_parse_eq_and_and() {
        let filter = InclusionFilter::parse(&json!({"$and": [
            {"uid": {"$exists": true}},
            {"scan_id": {"$eq": 7}}
        ]}))
        .unwrap();
        assert!(filter.accepts(&record(json!({"uid": "u", "scan_id": 7}))));
        assert!(!filter.accepts(&record(json!({"scan_id": 7}))));
    }

    #[test]
    fn test_parse_object_without_operators_is_equality() {
        let filter = InclusionFilter::parse(&json!({"sample": {"name": "Ni"}})).unwrap();
        assert!(filter.accepts(&record(json!({"sample": {"name": "Ni"}}))));
        assert!(!filter.accepts(&record(json!({"sample": {"name": "Cu"}}))));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert_eq!(
            InclusionFilter::parse(&json!([1, 2])).unwrap_err(),
            FilterParseError::NotAnObject {
                path: "$".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        let err = InclusionFilter::parse(&json!({"scan_id": {"$gt": 3}})).unwrap_err();
        assert!(matches!(
            err,
            FilterParseError::UnsupportedOperator { ref operator, .. } if operator == "$gt"
        ));

        let err = InclusionFilter::parse(&json!({"$nor": []})).unwrap_err();
        assert!(matches!(err, FilterParseError::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_operands() {
        for query in [
            json!({"$or": []}),
            json!({"$and": {"a": 1}}),
            json!({"$or": [1]}),
            json!({"a": {"$exists": "yes"}}),
            json!({"a": {"$in": "x"}}),
        ] {
            let err = InclusionFilter::parse(&query).unwrap_err();
            assert!(
                matches!(err, FilterParseError::InvalidOperand { .. }),
                "{query} -> {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_error_message_carries_path() {
        let err = InclusionFilter::parse(&json!({"$or": [{"a": {"$in": 3}}]})).unwrap_err();
        assert_eq!(err.to_string(), "'$in' at '$.$or[0].a' expects an array");
    }
}
