//! Index collaborator errors

use std::fmt;
use thiserror::Error;

use super::ports::IndexOp;

/// Why an index call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexErrorKind {
    /// The index rejected the operation
    Operation(IndexOp),
    /// The named index does not exist
    IndexNotFound,
    /// The scan query could not be parsed
    InvalidQuery,
    /// Connection, auth or protocol failure reported by the client
    Transport,
}

impl IndexErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexErrorKind::Operation(op) => op.as_str(),
            IndexErrorKind::IndexNotFound => "index_not_found",
            IndexErrorKind::InvalidQuery => "invalid_query",
            IndexErrorKind::Transport => "transport",
        }
    }
}

impl fmt::Display for IndexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure reported by an index collaborator
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct IndexError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: IndexErrorKind,
    pub message: String,
}

impl IndexError {
    pub fn new(kind: IndexErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// `op` was refused by the index
    pub fn operation(op: IndexOp, message: impl Into<String>) -> Self {
        Self::new(IndexErrorKind::Operation(op), message)
    }

    /// Operation that failed, when the failure came from one
    pub fn op(&self) -> Option<IndexOp> {
        match self.kind {
            IndexErrorKind::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn not_found(index: &str) -> Self {
        Self::new(IndexErrorKind::IndexNotFound, format!("no such index: {index}"))
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(IndexErrorKind::InvalidQuery, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(IndexErrorKind::Transport, message)
    }
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;
