//! Lazy lookup results
//!
//! A `LookupResults` is a single-pass iterator over record handles. Nothing is
//! fetched from the record store until a handle is resolved, and the index is
//! paged only as far as the caller iterates.

use std::fmt;

use super::error::LookupError;
use super::ports::RecordStore;
use crate::shared::models::{RecordId, RunRecord};

/// `(identifier, stop record)` pair; index scans always yield `None` stops
pub type RecordPair = (RecordId, Option<RunRecord>);

type PairStream<'a> = Box<dyn Iterator<Item = Result<RecordPair, LookupError>> + 'a>;

/// Identifier plus the store able to resolve it
pub struct RecordHandle<'s, S: RecordStore + ?Sized> {
    uid: RecordId,
    stop: Option<RunRecord>,
    store: &'s S,
}

impl<'s, S: RecordStore + ?Sized> RecordHandle<'s, S> {
    pub fn new(uid: RecordId, stop: Option<RunRecord>, store: &'s S) -> Self {
        Self { uid, stop, store }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn stop(&self) -> Option<&RunRecord> {
        self.stop.as_ref()
    }

    /// Fetch the full run record from the store
    pub fn resolve(&self) -> Result<RunRecord, LookupError> {
        self.store.resolve(&self.uid)
    }

    pub fn into_uid(self) -> RecordId {
        self.uid
    }
}

impl<S: RecordStore + ?Sized> fmt::Debug for RecordHandle<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordHandle")
            .field("uid", &self.uid)
            .field("stop", &self.stop)
            .finish_non_exhaustive()
    }
}

/// Single-pass sequence of record handles
///
/// Iterate again by issuing a new search.
pub struct LookupResults<'a, S: RecordStore + ?Sized> {
    pairs: PairStream<'a>,
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> LookupResults<'a, S> {
    pub fn from_pairs<I>(pairs: I, store: &'a S) -> Self
    where
        I: IntoIterator<Item = Result<RecordPair, LookupError>>,
        I::IntoIter: 'a,
    {
        Self {
            pairs: Box::new(pairs.into_iter()),
            store,
        }
    }

    /// Identifiers only, without touching the record store
    pub fn uids(self) -> impl Iterator<Item = Result<RecordId, LookupError>> + 'a {
        self.pairs.map(|pair| pair.map(|(uid, _)| uid))
    }
}

impl<'a, S: RecordStore + ?Sized> Iterator for LookupResults<'a, S> {
    type Item = Result<RecordHandle<'a, S>, LookupError>;

    fn next(&mut self) -> Option<Self::Item> {
        let store = self.store;
        self.pairs
            .next()
            .map(|pair| pair.map(|(uid, stop)| RecordHandle::new(uid, stop, store)))
    }
}
