//! Document maps
//!
//! A document map is the ordered table that decides which run-record fields
//! reach the index, under which name, and through which converter.
//!
//! Target names may repeat. Entries are applied in order, so a later entry
//! overwrites an earlier one with the same target; that is how a single
//! source field (e.g. `time`) feeds several targets, and how a preferred
//! source (e.g. `lead_experimenter`) supersedes a fallback (`bt_piLast`).

use super::converters::Converter;

/// One `(source, target, converter)` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub source: String,
    pub target: String,
    pub converter: Converter,
}

impl FieldMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>, converter: Converter) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            converter,
        }
    }
}

/// Named, ordered field-mapping table for one deployment profile
///
/// # Examples
///
/// ```rust
/// use brokersearch::features::mapping::{Converter, DocumentMap};
///
/// let map = DocumentMap::builder("demo")
///     .map("uid", "uid", Converter::Identity)
///     .map("time", "time", Converter::Identity)
///     .map("time", "date", Converter::IsoDate)
///     .build();
///
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.target_for("uid"), Some("uid"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMap {
    name: String,
    entries: Vec<FieldMapping>,
}

impl DocumentMap {
    pub fn new(name: impl Into<String>, entries: Vec<FieldMapping>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn builder(name: impl Into<String>) -> DocumentMapBuilder {
        DocumentMapBuilder {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldMapping> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Target that ends up holding `source` after all entries are applied
    ///
    /// When a source feeds several targets, the last entry wins.
    pub fn target_for(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.source == source)
            .map(|e| e.target.as_str())
    }

    /// Distinct target names, in first-appearance order
    pub fn targets(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.target.as_str()) {
                seen.push(entry.target.as_str());
            }
        }
        seen
    }
}

impl<'a> IntoIterator for &'a DocumentMap {
    type Item = &'a FieldMapping;
    type IntoIter = std::slice::Iter<'a, FieldMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Incremental constructor for [`DocumentMap`]
#[derive(Debug, Clone)]
pub struct DocumentMapBuilder {
    name: String,
    entries: Vec<FieldMapping>,
}

impl DocumentMapBuilder {
    pub fn map(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        converter: Converter,
    ) -> Self {
        self.entries
            .push(FieldMapping::new(source, target, converter));
        self
    }

    /// Shorthand for an identity mapping that keeps the field name
    pub fn keep(self, field: &str) -> Self {
        self.map(field, field, Converter::Identity)
    }

    pub fn build(self) -> DocumentMap {
        DocumentMap::new(self.name, self.entries)
    }
}
