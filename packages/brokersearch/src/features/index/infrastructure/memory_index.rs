//! In-Memory Index (for testing)
//!
//! HashMap-backed `IndexClient` that journals every call, so tests can assert
//! on the exact sequence of index operations. Failures can be injected per
//! operation kind. NOT for production use.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use tracing::debug;

use super::query::QueryString;
use crate::features::index::error::{IndexError, IndexResult};
use crate::features::index::ports::{
    HitStream, IndexClient, IndexHit, IndexOp, InsertAction, ScanRequest,
};
use crate::features::index::schema::IndexSchema;
use crate::shared::models::NormalizedDocument;

/// One call received by [`InMemoryIndex`], in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum IndexCall {
    DeleteIndex {
        index: String,
    },
    CreateIndex {
        index: String,
    },
    PutSchema {
        index: String,
        doc_type: String,
        schema: IndexSchema,
    },
    InsertDocument(InsertAction),
    Scan(ScanRequest),
}

impl IndexCall {
    pub fn op(&self) -> IndexOp {
        match self {
            IndexCall::DeleteIndex { .. } => IndexOp::DeleteIndex,
            IndexCall::CreateIndex { .. } => IndexOp::CreateIndex,
            IndexCall::PutSchema { .. } => IndexOp::PutSchema,
            IndexCall::InsertDocument(_) => IndexOp::InsertDocument,
            IndexCall::Scan(_) => IndexOp::Scan,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct StoredDocument {
    doc_type: String,
    source: NormalizedDocument,
}

#[derive(Debug, Default)]
struct IndexState {
    schemas: HashMap<String, IndexSchema>,
    documents: BTreeMap<String, StoredDocument>,
}

#[derive(Debug, Default)]
struct State {
    indices: HashMap<String, IndexState>,
    journal: Vec<IndexCall>,
    failures: HashMap<IndexOp, String>,
    failing_page: Option<(usize, String)>,
    pages_served: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    state: Arc<RwLock<State>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Test controls
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Make every later `op` call fail with `message`
    pub fn fail_on(&self, op: IndexOp, message: impl Into<String>) {
        self.write().failures.insert(op, message.into());
    }

    /// Make scans fail when fetching page number `page` (0-based)
    pub fn fail_page(&self, page: usize, message: impl Into<String>) {
        self.write().failing_page = Some((page, message.into()));
    }

    pub fn clear_failures(&self) {
        let mut state = self.write();
        state.failures.clear();
        state.failing_page = None;
    }

    /// Every call received so far, including failed ones
    pub fn calls(&self) -> Vec<IndexCall> {
        self.read().journal.clone()
    }

    pub fn call_ops(&self) -> Vec<IndexOp> {
        self.read().journal.iter().map(IndexCall::op).collect()
    }

    pub fn clear_calls(&self) {
        self.write().journal.clear();
    }

    /// Scan pages fetched so far across all scans
    pub fn pages_served(&self) -> usize {
        self.read().pages_served
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Inspection
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub fn has_index(&self, index: &str) -> bool {
        self.read().indices.contains_key(index)
    }

    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().indices.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn schema(&self, index: &str, doc_type: &str) -> Option<IndexSchema> {
        self.read()
            .indices
            .get(index)
            .and_then(|state| state.schemas.get(doc_type).cloned())
    }

    pub fn document(&self, index: &str, id: &str) -> Option<NormalizedDocument> {
        self.read()
            .indices
            .get(index)
            .and_then(|state| state.documents.get(id))
            .map(|doc| doc.source.clone())
    }

    pub fn document_type(&self, index: &str, id: &str) -> Option<String> {
        self.read()
            .indices
            .get(index)
            .and_then(|state| state.documents.get(id))
            .map(|doc| doc.doc_type.clone())
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.read()
            .indices
            .get(index)
            .map_or(0, |state| state.documents.len())
    }

    /// Journal the call and return the injected failure for its op, if any
    fn record(&self, call: IndexCall) -> IndexResult<RwLockWriteGuard<'_, State>> {
        let op = call.op();
        let mut state = self.write();
        state.journal.push(call);
        if let Some(message) = state.failures.get(&op).cloned() {
            return Err(IndexError::operation(op, message));
        }
        Ok(state)
    }
}

impl IndexClient for InMemoryIndex {
    fn delete_index(&self, index: &str) -> IndexResult<()> {
        let mut state = self.record(IndexCall::DeleteIndex {
            index: index.to_string(),
        })?;
        if state.indices.remove(index).is_none() {
            debug!(index, "delete of missing index ignored");
        }
        Ok(())
    }

    fn create_index(&self, index: &str) -> IndexResult<()> {
        let mut state = self.record(IndexCall::CreateIndex {
            index: index.to_string(),
        })?;
        if state.indices.contains_key(index) {
            return Err(IndexError::operation(
                IndexOp::CreateIndex,
                format!("index already exists: {index}"),
            ));
        }
        state.indices.insert(index.to_string(), IndexState::default());
        Ok(())
    }

    fn put_schema(&self, index: &str, doc_type: &str, schema: &IndexSchema) -> IndexResult<()> {
        let mut state = self.record(IndexCall::PutSchema {
            index: index.to_string(),
            doc_type: doc_type.to_string(),
            schema: schema.clone(),
        })?;
        let target = state
            .indices
            .get_mut(index)
            .ok_or_else(|| IndexError::not_found(index))?;
        target.schemas.insert(doc_type.to_string(), schema.clone());
        Ok(())
    }

    fn insert_document(&self, action: &InsertAction) -> IndexResult<()> {
        let mut state = self.record(IndexCall::InsertDocument(action.clone()))?;
        let target = state
            .indices
            .get_mut(&action.index)
            .ok_or_else(|| IndexError::not_found(&action.index))?;
        target.documents.insert(
            action.id.clone(),
            StoredDocument {
                doc_type: action.doc_type.clone(),
                source: action.source.clone(),
            },
        );
        Ok(())
    }

    fn scan(&self, request: ScanRequest) -> IndexResult<HitStream<'_>> {
        let state = self.record(IndexCall::Scan(request.clone()))?;
        if !state.indices.contains_key(&request.index) {
            return Err(IndexError::not_found(&request.index));
        }
        drop(state);

        let query = QueryString::parse(&request.query)?;
        Ok(Box::new(PagedScan {
            owner: self,
            page_size: request.page_size(),
            index: request.index,
            source_fields: request.source_fields,
            query,
            cursor: None,
            page: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }))
    }
}

/// Lazy scroll over one index, fetching `page_size` hits at a time by id order
struct PagedScan<'a> {
    owner: &'a InMemoryIndex,
    index: String,
    query: QueryString,
    source_fields: Vec<String>,
    page_size: usize,
    cursor: Option<String>,
    page: usize,
    buffer: VecDeque<IndexHit>,
    exhausted: bool,
}

impl PagedScan<'_> {
    fn fetch_page(&mut self) -> IndexResult<()> {
        let owner = self.owner;
        let mut state = owner.write();
        state.pages_served += 1;

        if let Some((page, message)) = &state.failing_page {
            if *page == self.page {
                return Err(IndexError::operation(IndexOp::Scan, message.clone()));
            }
        }

        let target = state
            .indices
            .get(&self.index)
            .ok_or_else(|| IndexError::not_found(&self.index))?;

        let lower = match &self.cursor {
            Some(last) => Bound::Excluded(last.clone()),
            None => Bound::Unbounded,
        };

        let mut fetched = 0;
        for (id, doc) in target.documents.range((lower, Bound::Unbounded)) {
            if fetched == self.page_size {
                break;
            }
            self.cursor = Some(id.clone());
            let source = doc.source.fields();
            if !self.query.matches(id, source) {
                continue;
            }
            self.buffer.push_back(IndexHit {
                id: id.clone(),
                source: restrict(source, &self.source_fields),
            });
            fetched += 1;
        }

        if fetched < self.page_size {
            self.exhausted = true;
        }
        self.page += 1;
        Ok(())
    }
}

impl Iterator for PagedScan<'_> {
    type Item = IndexResult<IndexHit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

fn restrict(source: &Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    if fields.is_empty() {
        return source.clone();
    }
    source
        .iter()
        .filter(|(name, _)| fields.iter().any(|f| f == *name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
