//! Index Port (Trait Interface)
//!
//! The search index is an external service. Everything in this crate talks to
//! it through `IndexClient`, so a network client and the in-memory test double
//! are interchangeable.

use serde_json::{json, Map, Value};

use super::error::IndexResult;
use super::schema::IndexSchema;
use crate::shared::models::NormalizedDocument;

/// Operations of the [`IndexClient`] port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexOp {
    DeleteIndex,
    CreateIndex,
    PutSchema,
    InsertDocument,
    Scan,
}

impl IndexOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexOp::DeleteIndex => "delete_index",
            IndexOp::CreateIndex => "create_index",
            IndexOp::PutSchema => "put_schema",
            IndexOp::InsertDocument => "insert_document",
            IndexOp::Scan => "scan",
        }
    }
}

/// Default number of hits fetched per scan page
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 500;

/// One streaming scan over an index
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub index: String,
    /// Query in the index's native query-string language
    pub query: String,
    /// Stored fields to return; empty means all
    pub source_fields: Vec<String>,
    /// Extra scan parameters passed through to the client
    pub params: Map<String, Value>,
}

impl ScanRequest {
    pub fn new(index: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            query: query.into(),
            source_fields: Vec::new(),
            params: Map::new(),
        }
    }

    pub fn with_source_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params.extend(params);
        self
    }

    /// `size` parameter, falling back to [`DEFAULT_SCAN_PAGE_SIZE`]
    pub fn page_size(&self) -> usize {
        self.params
            .get("size")
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_SCAN_PAGE_SIZE)
    }
}

/// One scan result
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub id: String,
    pub source: Map<String, Value>,
}

/// Lazy scan result stream; each item may block on the next page
pub type HitStream<'a> = Box<dyn Iterator<Item = IndexResult<IndexHit>> + 'a>;

/// Document insertion request
#[derive(Debug, Clone, PartialEq)]
pub struct InsertAction {
    pub index: String,
    pub id: String,
    /// Document classification (the deployment's beamline)
    pub doc_type: String,
    pub source: NormalizedDocument,
}

impl InsertAction {
    /// Bulk-action form: `{_index, _id, _type, _source}`
    pub fn to_bulk_value(&self) -> Value {
        json!({
            "_index": self.index,
            "_id": self.id,
            "_type": self.doc_type,
            "_source": self.source,
        })
    }
}

/// Index collaborator port
///
/// Calls block until the index answers. Retries and timeouts belong to the
/// implementation, not to callers.
pub trait IndexClient {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Lifecycle
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Drop `index`; a missing index is not an error
    fn delete_index(&self, index: &str) -> IndexResult<()>;

    /// Create an empty `index`
    fn create_index(&self, index: &str) -> IndexResult<()>;

    /// Declare field types for documents of class `doc_type`
    fn put_schema(&self, index: &str, doc_type: &str, schema: &IndexSchema) -> IndexResult<()>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Documents
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn insert_document(&self, action: &InsertAction) -> IndexResult<()>;

    /// Start a streaming scan
    ///
    /// Errors detected up front (unknown index, unparsable query) are returned
    /// directly; later page failures surface as stream items.
    fn scan(&self, request: ScanRequest) -> IndexResult<HitStream<'_>>;
}
