//! Reverse lookup
//!
//! ```text
//! query ──scan(index, query, [id field])──> hits ──id field──> (uid, None)
//!                                                                  │
//!                                        RecordHandle ──resolve──> RunRecord
//! ```
//!
//! The scan only asks for the identifier field, so the round trip works as
//! long as the document map copies the identifier into the document.

use serde_json::{Map, Value};
use tracing::info;

use super::error::LookupError;
use super::ports::RecordStore;
use super::results::{LookupResults, RecordPair};
use crate::config::registry::{DeploymentProfile, DEFAULT_ID_FIELD};
use crate::features::index::ports::{IndexClient, IndexHit, ScanRequest};

pub struct ReverseLookup<'a, C: IndexClient + ?Sized, S: RecordStore + ?Sized> {
    client: &'a C,
    store: &'a S,
    index: String,
    id_field: String,
}

impl<'a, C: IndexClient + ?Sized, S: RecordStore + ?Sized> ReverseLookup<'a, C, S> {
    pub fn new(client: &'a C, store: &'a S, index: impl Into<String>) -> Self {
        Self {
            client,
            store,
            index: index.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    /// Lookup over the profile's index, reading the identifier from the
    /// document field the profile maps it to
    pub fn for_profile(profile: &DeploymentProfile, client: &'a C, store: &'a S) -> Self {
        Self::new(client, store, profile.index()).with_id_field(profile.id_target())
    }

    /// Document field holding the identifier
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Run `query` and return lazily resolvable handles
    ///
    /// `params` are passed to the scan unchanged (e.g. `size`). Each call
    /// issues a fresh scan.
    ///
    /// # Errors
    ///
    /// Failures to start the scan are returned here; page failures and
    /// malformed hits surface as items of the returned sequence.
    pub fn search(
        &self,
        query: &str,
        params: Map<String, Value>,
    ) -> Result<LookupResults<'a, S>, LookupError> {
        info!(index = %self.index, query, "starting reverse lookup scan");

        let request = ScanRequest::new(self.index.as_str(), query)
            .with_source_fields([self.id_field.as_str()])
            .with_params(params);
        let client: &'a C = self.client;
        let hits = client.scan(request)?;

        let id_field = self.id_field.clone();
        let pairs = hits.map(move |hit| -> Result<RecordPair, LookupError> {
            let hit = hit?;
            identifier_pair(hit, &id_field)
        });
        Ok(LookupResults::from_pairs(pairs, self.store))
    }
}

fn identifier_pair(hit: IndexHit, id_field: &str) -> Result<RecordPair, LookupError> {
    match hit.source.get(id_field) {
        Some(Value::String(uid)) if !uid.is_empty() => Ok((uid.clone(), None)),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok((n.to_string(), None)),
        _ => Err(LookupError::MalformedHit {
            hit_id: hit.id,
            field: id_field.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::index::{InMemoryIndex, IndexCall, InsertAction};
    use crate::features::lookup::infrastructure::InMemoryRecordStore;
    use crate::shared::models::{NormalizedDocument, RunRecord};
    use serde_json::json;

    fn put(index: &InMemoryIndex, id: &str, source: Value) {
        let mut doc = NormalizedDocument::new();
        if let Value::Object(map) = source {
            for (k, v) in map {
                doc.insert(k, v);
            }
        }
        index
            .insert_document(&InsertAction {
                index: "xpd".to_string(),
                id: id.to_string(),
                doc_type: "xpd".to_string(),
                source: doc,
            })
            .unwrap();
    }

    fn fixture() -> (InMemoryIndex, InMemoryRecordStore) {
        let index = InMemoryIndex::new();
        index.create_index("xpd").unwrap();
        put(&index, "u-1", json!({"uid": "u-1", "pi": "Billinge"}));
        put(&index, "u-2", json!({"uid": "u-2", "pi": "Bozin"}));

        let store = InMemoryRecordStore::new();
        store.insert("u-1", RunRecord::from_value(json!({"uid": "u-1", "scan_id": 1})).unwrap());
        store.insert("u-2", RunRecord::from_value(json!({"uid": "u-2", "scan_id": 2})).unwrap());
        index.clear_calls();
        (index, store)
    }

    #[test]
    fn test_search_restricts_scan_to_id_field() {
        let (index, store) = fixture();
        let lookup = ReverseLookup::new(&index, &store, "xpd");
        let _ = lookup.search("pi:billinge", Map::new()).unwrap();

        let calls = index.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            &calls[0],
            IndexCall::Scan(ScanRequest { source_fields, query, .. })
                if source_fields == &vec!["uid".to_string()] && query == "pi:billinge"
        ));
    }

    #[test]
    fn test_search_yields_resolvable_handles() {
        let (index, store) = fixture();
        let lookup = ReverseLookup::new(&index, &store, "xpd");

        let handles: Vec<_> = lookup
            .search("pi:bozin", Map::new())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].uid(), "u-2");
        assert_eq!(store.resolutions(), 0);
        assert_eq!(handles[0].resolve().unwrap().get("scan_id"), Some(&json!(2)));
    }

    #[test]
    fn test_search_no_matches() {
        let (index, store) = fixture();
        let results = ReverseLookup::new(&index, &store, "xpd")
            .search("pi:nobody", Map::new())
            .unwrap();
        assert_eq!(results.count(), 0);
    }

    #[test]
    fn test_hit_without_id_field_is_malformed() {
        let (index, store) = fixture();
        put(&index, "u-3", json!({"pi": "Bozin"}));

        let items: Vec<_> = ReverseLookup::new(&index, &store, "xpd")
            .search("pi:bozin", Map::new())
            .unwrap()
            .collect();

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(
            &items[1],
            Err(LookupError::MalformedHit { hit_id, field }) if hit_id == "u-3" && field == "uid"
        ));
    }

    #[test]
    fn test_search_missing_index() {
        let (index, store) = fixture();
        let err = ReverseLookup::new(&index, &store, "iss")
            .search("*", Map::new())
            .err()
            .unwrap();
        assert!(matches!(err, LookupError::Index(_)));
    }

    #[test]
    fn test_custom_id_field() {
        let index = InMemoryIndex::new();
        index.create_index("xpd").unwrap();
        put(&index, "7", json!({"run_uid": 7}));
        let store = InMemoryRecordStore::new();

        let uids: Vec<String> = ReverseLookup::new(&index, &store, "xpd")
            .with_id_field("run_uid")
            .search("*", Map::new())
            .unwrap()
            .uids()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(uids, vec!["7".to_string()]);
    }
}
