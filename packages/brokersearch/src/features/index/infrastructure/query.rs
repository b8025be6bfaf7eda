//! Query-string subset for the in-memory index
//!
//! ```text
//! *  |  *:*                 match all
//! field:value               field equals value (case-insensitive, any array element)
//! field:"two words"         field contains the phrase
//! field:*                   field is present
//! value                     any stored field matches value
//! a AND b                   conjunction (binds tighter)
//! a OR b  |  a b            disjunction
//! ```
//!
//! Parsed into disjunctive normal form: a list of AND-groups, any of which
//! may match. Dotted field names reach into nested objects; `_id` matches the
//! document id.

use serde_json::{Map, Value};

use crate::features::index::error::{IndexError, IndexResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Needle {
    Word(String),
    Phrase(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    MatchAll,
    Present(String),
    Field { field: String, needle: Needle },
    AnyField(Needle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    And,
    Or,
    Term(Term),
}

/// Parsed query in disjunctive normal form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryString {
    groups: Vec<Vec<Term>>,
}

impl QueryString {
    pub fn parse(input: &str) -> IndexResult<Self> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(IndexError::invalid_query("empty query"));
        }

        let mut groups: Vec<Vec<Term>> = Vec::new();
        let mut current: Vec<Term> = Vec::new();
        let mut pending_and = false;
        let mut last_was_operator = true;

        for token in tokens {
            match token {
                Token::And | Token::Or if last_was_operator => {
                    return Err(IndexError::invalid_query(format!(
                        "misplaced operator in '{input}'"
                    )));
                }
                Token::And => {
                    pending_and = true;
                    last_was_operator = true;
                }
                Token::Or => {
                    groups.push(std::mem::take(&mut current));
                    last_was_operator = true;
                }
                Token::Term(term) => {
                    if !pending_and && !current.is_empty() {
                        groups.push(std::mem::take(&mut current));
                    }
                    current.push(term);
                    pending_and = false;
                    last_was_operator = false;
                }
            }
        }

        if last_was_operator {
            return Err(IndexError::invalid_query(format!(
                "dangling operator in '{input}'"
            )));
        }
        groups.push(current);

        Ok(Self { groups })
    }

    pub fn matches(&self, id: &str, source: &Map<String, Value>) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|term| term_matches(term, id, source)))
    }
}

fn tokenize(input: &str) -> IndexResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut word = String::new();
        let mut phrase: Option<String> = None;
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            if c == '"' {
                let mut quoted = String::new();
                let mut closed = false;
                for q in chars.by_ref() {
                    if q == '"' {
                        closed = true;
                        break;
                    }
                    quoted.push(q);
                }
                if !closed {
                    return Err(IndexError::invalid_query(format!(
                        "unterminated quote in '{input}'"
                    )));
                }
                phrase = Some(quoted);
            } else {
                word.push(c);
            }
        }

        tokens.push(match (word.as_str(), phrase) {
            ("AND" | "&&", None) => Token::And,
            ("OR" | "||", None) => Token::Or,
            (_, phrase) => Token::Term(parse_term(&word, phrase, input)?),
        });
    }

    Ok(tokens)
}

fn parse_term(word: &str, phrase: Option<String>, input: &str) -> IndexResult<Term> {
    if let Some(phrase) = phrase {
        return match word.strip_suffix(':') {
            Some(field) if !field.is_empty() => Ok(Term::Field {
                field: field.to_string(),
                needle: Needle::Phrase(phrase.to_lowercase()),
            }),
            _ if word.is_empty() => Ok(Term::AnyField(Needle::Phrase(phrase.to_lowercase()))),
            _ => Err(IndexError::invalid_query(format!(
                "misplaced quote in '{input}'"
            ))),
        };
    }

    if word == "*" || word == "*:*" {
        return Ok(Term::MatchAll);
    }

    match word.split_once(':') {
        Some((field, _)) if field.is_empty() => Err(IndexError::invalid_query(format!(
            "missing field name in '{input}'"
        ))),
        Some((_, value)) if value.is_empty() => Err(IndexError::invalid_query(format!(
            "missing value in '{input}'"
        ))),
        Some((field, "*")) => Ok(Term::Present(field.to_string())),
        Some((field, value)) => Ok(Term::Field {
            field: field.to_string(),
            needle: Needle::Word(value.to_lowercase()),
        }),
        None => Ok(Term::AnyField(Needle::Word(word.to_lowercase()))),
    }
}

fn term_matches(term: &Term, id: &str, source: &Map<String, Value>) -> bool {
    match term {
        Term::MatchAll => true,
        Term::Present(field) => field == "_id" || lookup(source, field).is_some(),
        Term::Field { field, needle } if field == "_id" => {
            needle_matches(needle, &Value::String(id.to_string()))
        }
        Term::Field { field, needle } => {
            lookup(source, field).map_or(false, |value| needle_matches(needle, value))
        }
        Term::AnyField(needle) => source.values().any(|value| needle_matches(needle, value)),
    }
}

fn lookup<'v>(source: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
    if let Some(value) = source.get(path) {
        return Some(value);
    }
    let mut parts = path.split('.');
    let mut current = source.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn needle_matches(needle: &Needle, value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|item| needle_matches(needle, item)),
        Value::Object(fields) => fields.values().any(|item| needle_matches(needle, item)),
        Value::Null => false,
        Value::String(s) => text_matches(needle, s),
        Value::Bool(b) => text_matches(needle, if *b { "true" } else { "false" }),
        Value::Number(n) => text_matches(needle, &n.to_string()),
    }
}

fn text_matches(needle: &Needle, text: &str) -> bool {
    let text = text.to_lowercase();
    match needle {
        Needle::Word(word) => {
            text == *word
                || text
                    .split(|c: char| !c.is_alphanumeric() && c != '_' && c != '-' && c != '.')
                    .any(|w| w == word)
        }
        Needle::Phrase(phrase) => text.contains(phrase.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::index::error::IndexErrorKind;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn matches(query: &str, source: Value) -> bool {
        QueryString::parse(query).unwrap().matches("id-1", &doc(source))
    }

    #[test]
    fn test_match_all() {
        assert!(matches("*", json!({})));
        assert!(matches("*:*", json!({"uid": "u"})));
    }

    #[test]
    fn test_field_equality_is_case_insensitive() {
        let source = json!({"pi": "Billinge", "scan_id": 7, "dark_frame": true});
        assert!(matches("pi:billinge", source.clone()));
        assert!(matches("scan_id:7", source.clone()));
        assert!(matches("dark_frame:true", source.clone()));
        assert!(!matches("pi:bozin", source.clone()));
        assert!(!matches("missing:x", source));
    }

    #[test]
    fn test_words_and_phrases() {
        let source = json!({"comment": "Ni powder at 300K, second pass"});
        assert!(matches("comment:powder", source.clone()));
        assert!(matches("comment:\"powder at 300k\"", source.clone()));
        assert!(!matches("comment:\"at powder\"", source.clone()));
        assert!(matches("\"second pass\"", source));
    }

    #[test]
    fn test_arrays_and_nested_fields() {
        let source = json!({
            "experimenters": ["Abeykoon", "Bozin"],
            "composition": {"Ni": 0.5, "O": 0.5}
        });
        assert!(matches("experimenters:bozin", source.clone()));
        assert!(matches("composition.Ni:0.5", source.clone()));
        assert!(matches("composition.O:*", source.clone()));
        assert!(!matches("composition.Cu:*", source));
    }

    #[test]
    fn test_bare_term_searches_all_fields() {
        let source = json!({"pi": "Billinge", "group": "xpd"});
        assert!(matches("xpd", source.clone()));
        assert!(!matches("iss", source));
    }

    #[test]
    fn test_id_field() {
        assert!(matches("_id:id-1", json!({})));
        assert!(matches("_id:*", json!({})));
        assert!(!matches("_id:id-2", json!({})));
    }

    #[test]
    fn test_boolean_operators() {
        let source = json!({"pi": "Billinge", "year": 2017});
        assert!(matches("pi:billinge AND year:2017", source.clone()));
        assert!(!matches("pi:billinge AND year:2018", source.clone()));
        assert!(matches("pi:bozin OR year:2017", source.clone()));
        assert!(matches("pi:bozin year:2017", source.clone()));
        assert!(matches("pi:bozin AND year:2018 OR pi:billinge", source.clone()));
        assert!(!matches("pi:bozin AND year:2017", source));
    }

    #[test]
    fn test_parse_errors() {
        for query in ["", "   ", "AND pi:x", "pi:x OR", "pi:x AND OR y", ":x", "pi:", "pi:\"open"] {
            let err = QueryString::parse(query).unwrap_err();
            assert_eq!(err.kind, IndexErrorKind::InvalidQuery, "{query}");
        }
    }
}
