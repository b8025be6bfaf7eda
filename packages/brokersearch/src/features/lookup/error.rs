//! Reverse lookup errors

use thiserror::Error;

use crate::features::index::error::IndexError;

#[derive(Debug, Error)]
pub enum LookupError {
    /// The scan could not be started or a page failed
    #[error("index scan failed: {0}")]
    Index(#[from] IndexError),

    /// A hit lacks the identifier field it was asked to return
    #[error("hit '{hit_id}' carries no usable '{field}' identifier")]
    MalformedHit { hit_id: String, field: String },

    /// The record store has no record with this identifier
    #[error("no run record with uid '{uid}'")]
    RecordNotFound { uid: String },

    /// The record store itself failed
    #[error("record store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LookupError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }
}
