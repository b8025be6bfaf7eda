//! In-Memory Record Store (for testing)
//!
//! HashMap keyed by run identifier. Counts resolutions so tests can check
//! that lookups resolve lazily.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::features::lookup::error::LookupError;
use crate::features::lookup::ports::RecordStore;
use crate::shared::models::{RecordId, RunRecord};

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<RecordId, RunRecord>>>,
    resolutions: Arc<AtomicUsize>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store every record that has a usable `id_field`; returns how many were kept
    pub fn from_records<I>(id_field: &str, records: I) -> (Self, usize)
    where
        I: IntoIterator<Item = RunRecord>,
    {
        let store = Self::new();
        let mut kept = 0;
        for record in records {
            if let Some(id) = record.identifier(id_field) {
                store.insert(id, record);
                kept += 1;
            }
        }
        (store, kept)
    }

    pub fn insert(&self, uid: impl Into<RecordId>, record: RunRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uid.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `resolve` calls so far
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn resolve(&self, uid: &str) -> Result<RunRecord, LookupError> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uid)
            .cloned()
            .ok_or_else(|| LookupError::RecordNotFound {
                uid: uid.to_string(),
            })
    }
}
