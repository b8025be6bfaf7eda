//! Index synchronizer
//!
//! Full-replace lifecycle, run once per accepted record:
//!
//! ```text
//! RunRecord
//!   │ filter rejects ──────────────────────────> Skipped (no index calls)
//!   ▼
//! transform + identifier   (errors here make no index calls)
//!   ▼
//! delete_index → create_index → put_schema → insert_document
//!   │ any step fails ──> SyncError::Index (earlier steps are not rolled back)
//!   ▼
//! Replaced
//! ```
//!
//! After a successful sync the index holds exactly one document: the newest
//! accepted run. There is no locking; concurrent syncs against one index may
//! interleave their steps.

use tracing::{debug, info};

use super::error::SyncError;
use super::ports::RunObserver;
use crate::config::registry::DeploymentProfile;
use crate::features::index::ports::{IndexClient, InsertAction};
use crate::features::mapping::transformer::DocumentTransformer;
use crate::shared::models::{RecordId, RunRecord};

/// Result of one synchronization event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The profile's filter rejected the record
    Skipped { beamline: String },
    /// The index was rebuilt around this record's document
    Replaced {
        index: String,
        id: RecordId,
        fields: usize,
    },
}

impl SyncOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, SyncOutcome::Replaced { .. })
    }
}

/// Mirrors run records of one deployment profile into its index
pub struct IndexSynchronizer<'a, C: IndexClient + ?Sized> {
    profile: &'a DeploymentProfile,
    client: &'a C,
}

impl<'a, C: IndexClient + ?Sized> IndexSynchronizer<'a, C> {
    pub fn new(profile: &'a DeploymentProfile, client: &'a C) -> Self {
        Self { profile, client }
    }

    pub fn profile(&self) -> &'a DeploymentProfile {
        self.profile
    }

    /// Build the insert action for `record` without touching the index
    ///
    /// `Ok(None)` when the filter rejects the record.
    pub fn prepare(&self, record: &RunRecord) -> Result<Option<InsertAction>, SyncError> {
        if !self.profile.filter().accepts(record) {
            return Ok(None);
        }

        let document = DocumentTransformer::new(self.profile.document_map()).transform(record)?;
        let id = record
            .identifier(self.profile.id_field())
            .ok_or_else(|| SyncError::MissingIdentifier {
                field: self.profile.id_field().to_string(),
            })?;

        Ok(Some(InsertAction {
            index: self.profile.index().to_string(),
            id,
            doc_type: self.profile.beamline().to_string(),
            source: document,
        }))
    }

    /// Replace the profile's index contents with `record`'s document
    pub fn sync(&self, record: &RunRecord) -> Result<SyncOutcome, SyncError> {
        let Some(action) = self.prepare(record)? else {
            info!(
                beamline = self.profile.beamline(),
                id = record.identifier(self.profile.id_field()).as_deref().unwrap_or("?"),
                "run rejected by inclusion filter"
            );
            return Ok(SyncOutcome::Skipped {
                beamline: self.profile.beamline().to_string(),
            });
        };

        let index = self.profile.index();
        debug!(index, id = %action.id, fields = action.source.len(), "rebuilding index");

        self.client.delete_index(index)?;
        self.client.create_index(index)?;
        self.client
            .put_schema(index, self.profile.beamline(), self.profile.schema())?;
        debug!(index, declarations = self.profile.schema().len(), "schema declared");
        self.client.insert_document(&action)?;

        info!(index, id = %action.id, "index replaced");
        Ok(SyncOutcome::Replaced {
            index: index.to_string(),
            fields: action.source.len(),
            id: action.id,
        })
    }
}

impl<C: IndexClient + ?Sized> RunObserver for IndexSynchronizer<'_, C> {
    fn run_completed(&self, record: &RunRecord) -> Result<(), SyncError> {
        self.sync(record).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::preset::BuiltinProfile;
    use crate::features::index::{InMemoryIndex, IndexOp};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RunRecord {
        RunRecord::from_value(value).unwrap()
    }

    fn xpd() -> DeploymentProfile {
        BuiltinProfile::Xpd.profile().unwrap()
    }

    #[test]
    fn test_prepare_builds_insert_action() {
        let profile = xpd();
        let index = InMemoryIndex::new();
        let action = IndexSynchronizer::new(&profile, &index)
            .prepare(&record(json!({
                "_id": 42,
                "uid": "u-1",
                "bt_piLast": "Billinge",
                "bt_safN": 300123,
                "dark_frame": 0,
                "time": 1500000000
            })))
            .unwrap()
            .unwrap();

        assert_eq!(action.index, "xpd");
        assert_eq!(action.id, "u-1");
        assert_eq!(action.doc_type, "xpd");
        assert_eq!(action.source.get("xpdid"), Some(&json!("42")));
        assert_eq!(action.source.get("saf"), Some(&json!("300123")));
        assert_eq!(action.source.get("dark_frame"), Some(&json!(false)));
        assert_eq!(action.source.get("pi"), Some(&json!("Billinge")));
        assert!(index.calls().is_empty());
    }

    #[test]
    fn test_rejected_record_makes_no_index_calls() {
        let profile = xpd();
        let index = InMemoryIndex::new();
        let outcome = IndexSynchronizer::new(&profile, &index)
            .sync(&record(json!({"uid": "u-1", "bt_piLast": "Smith"})))
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Skipped {
                beamline: "xpd".to_string()
            }
        );
        assert!(index.calls().is_empty());
    }

    #[test]
    fn test_accepted_record_rebuilds_index_in_order() {
        let profile = xpd();
        let index = InMemoryIndex::new();
        let outcome = IndexSynchronizer::new(&profile, &index)
            .sync(&record(json!({"uid": "u-1", "time": 1500000000.5})))
            .unwrap();

        assert!(outcome.is_replaced());
        assert_eq!(
            index.call_ops(),
            vec![
                IndexOp::DeleteIndex,
                IndexOp::CreateIndex,
                IndexOp::PutSchema,
                IndexOp::InsertDocument,
            ]
        );
        assert_eq!(index.document_count("xpd"), 1);
        assert_eq!(
            index.document("xpd", "u-1").unwrap().get("uid"),
            Some(&json!("u-1"))
        );
    }

    #[test]
    fn test_conversion_error_makes_no_index_calls() {
        let profile = xpd();
        let index = InMemoryIndex::new();
        let err = IndexSynchronizer::new(&profile, &index)
            .sync(&record(json!({"uid": "u-1", "sp_num_frames": "many"})))
            .unwrap_err();

        assert!(matches!(err, SyncError::Conversion(ref e) if e.field.as_deref() == Some("sp_num_frames")));
        assert!(index.calls().is_empty());
    }

    #[test]
    fn test_missing_identifier_makes_no_index_calls() {
        let profile = xpd();
        let index = InMemoryIndex::new();
        let err = IndexSynchronizer::new(&profile, &index)
            .sync(&record(json!({"time": 1500000000})))
            .unwrap_err();

        assert!(matches!(err, SyncError::MissingIdentifier { ref field } if field == "uid"));
        assert!(index.calls().is_empty());
    }

    #[test]
    fn test_index_failure_stops_lifecycle() {
        let profile = xpd();
        let index = InMemoryIndex::new();
        index.fail_on(IndexOp::PutSchema, "mapping conflict");

        let err = IndexSynchronizer::new(&profile, &index)
            .sync(&record(json!({"uid": "u-1"})))
            .unwrap_err();

        assert!(matches!(err, SyncError::Index(ref e) if e.op() == Some(IndexOp::PutSchema)));
        assert_eq!(
            index.call_ops(),
            vec![
                IndexOp::DeleteIndex,
                IndexOp::CreateIndex,
                IndexOp::PutSchema,
            ]
        );
        // created index is left behind empty
        assert!(index.has_index("xpd"));
        assert_eq!(index.document_count("xpd"), 0);
    }

    #[test]
    fn test_run_observer_delegates_to_sync() {
        let profile = BuiltinProfile::Iss.profile().unwrap();
        let index = InMemoryIndex::new();
        let observer: &dyn RunObserver = &IndexSynchronizer::new(&profile, &index);

        observer.run_completed(&record(json!({"uid": "a"}))).unwrap();
        observer.run_completed(&record(json!({"uid": "b"}))).unwrap();

        assert_eq!(index.document_count("iss"), 1);
        assert!(index.document("iss", "b").is_some());
    }
}
