//! Document transformer
//!
//! ```text
//! RunRecord ──(DocumentMap, in order)──> NormalizedDocument
//!
//!   source missing / null   → skip
//!   converter → Ok(None)    → skip
//!   converter → Ok(Some(v)) → doc[target] = v   (overwrites)
//!   converter → Err(e)      → abort
//! ```

use tracing::trace;

use super::document_map::DocumentMap;
use super::error::ConversionError;
use crate::shared::models::{NormalizedDocument, RunRecord};

/// Applies one document map to run records
#[derive(Debug, Clone, Copy)]
pub struct DocumentTransformer<'m> {
    map: &'m DocumentMap,
}

impl<'m> DocumentTransformer<'m> {
    pub fn new(map: &'m DocumentMap) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &'m DocumentMap {
        self.map
    }

    /// Build the normalized document for `record`
    ///
    /// The result depends only on the map and the record, so applying it twice
    /// yields the same document.
    ///
    /// # Errors
    ///
    /// The first `ConversionError`, tagged with the source field name.
    pub fn transform(&self, record: &RunRecord) -> Result<NormalizedDocument, ConversionError> {
        let mut doc = NormalizedDocument::new();

        for entry in self.map {
            let value = match record.get(&entry.source) {
                None | Some(serde_json::Value::Null) => continue,
                Some(value) => value,
            };

            match entry
                .converter
                .apply(value)
                .map_err(|e| e.with_field(entry.source.as_str()))?
            {
                Some(converted) => {
                    doc.insert(entry.target.as_str(), converted);
                }
                None => trace!(
                    source = %entry.source,
                    target = %entry.target,
                    converter = %entry.converter,
                    "converter produced no value"
                ),
            }
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::mapping::Converter;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RunRecord {
        RunRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_transform_renames_and_converts() {
        let map = DocumentMap::builder("t")
            .map("_id", "issid", Converter::Str)
            .keep("uid")
            .map("cycle", "cycle", Converter::Int)
            .map("PI", "pi", Converter::Identity)
            .build();

        let doc = DocumentTransformer::new(&map)
            .transform(&record(json!({
                "_id": 5,
                "uid": "u-1",
                "cycle": "2",
                "PI": "Ehrlich",
                "unmapped": true
            })))
            .unwrap();

        assert_eq!(
            doc.into_value(),
            json!({"issid": "5", "uid": "u-1", "cycle": 2, "pi": "Ehrlich"})
        );
    }

    #[test]
    fn test_transform_skips_missing_and_null_sources() {
        let map = DocumentMap::builder("t")
            .keep("uid")
            .keep("comment")
            .map("cycle", "cycle", Converter::Int)
            .build();

        let doc = DocumentTransformer::new(&map)
            .transform(&record(json!({"uid": "u", "cycle": null})))
            .unwrap();

        assert_eq!(doc.into_value(), json!({"uid": "u"}));
    }

    #[test]
    fn test_transform_fans_out_one_source() {
        let map = DocumentMap::builder("t")
            .keep("time")
            .map("time", "date", Converter::IsoDateUtc)
            .map("time", "year", Converter::YearUtc)
            .build();

        let doc = DocumentTransformer::new(&map)
            .transform(&record(json!({"time": 1609459200.123})))
            .unwrap();

        assert_eq!(
            doc.into_value(),
            json!({
                "time": 1609459200.123,
                "date": "2021-01-01T00:00:00.123",
                "year": 2021
            })
        );
    }

    #[test]
    fn test_transform_later_entry_wins() {
        let map = DocumentMap::builder("t")
            .map("bt_piLast", "pi", Converter::Identity)
            .map("lead_experimenter", "pi", Converter::Identity)
            .build();
        let transformer = DocumentTransformer::new(&map);

        let both = transformer
            .transform(&record(json!({"bt_piLast": "Billinge", "lead_experimenter": "Bozin"})))
            .unwrap();
        assert_eq!(both.get("pi"), Some(&json!("Bozin")));

        let fallback = transformer
            .transform(&record(json!({"bt_piLast": "Billinge"})))
            .unwrap();
        assert_eq!(fallback.get("pi"), Some(&json!("Billinge")));
    }

    #[test]
    fn test_transform_absent_result_does_not_clear_earlier_value() {
        let map = DocumentMap::builder("t")
            .map("names", "people", Converter::Identity)
            .map("experimenters", "people", Converter::ListOfStrings)
            .build();

        let doc = DocumentTransformer::new(&map)
            .transform(&record(json!({"names": "A and B", "experimenters": ["A", 2]})))
            .unwrap();

        assert_eq!(doc.get("people"), Some(&json!("A and B")));
    }

    #[test]
    fn test_transform_conversion_error_names_field() {
        let map = DocumentMap::builder("t")
            .map("cycle", "cycle", Converter::Int)
            .build();

        let err = DocumentTransformer::new(&map)
            .transform(&record(json!({"cycle": "spring"})))
            .unwrap_err();

        assert_eq!(err.field.as_deref(), Some("cycle"));
        assert_eq!(err.converter, "integer");
    }

    #[test]
    fn test_transform_is_idempotent() {
        let map = DocumentMap::builder("t")
            .keep("uid")
            .map("sample_composition", "composition", Converter::NormalizeCounts)
            .map("time", "date", Converter::IsoDate)
            .build();
        let input = record(json!({
            "uid": "u",
            "sample_composition": {"Ni": 1, "O": 1},
            "time": 1500000000.5
        }));
        let transformer = DocumentTransformer::new(&map);

        assert_eq!(
            transformer.transform(&input).unwrap(),
            transformer.transform(&input).unwrap()
        );
    }
}
