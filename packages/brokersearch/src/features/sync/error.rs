//! Synchronization errors

use thiserror::Error;

use crate::features::index::error::IndexError;
use crate::features::mapping::error::ConversionError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A present value could not be converted; nothing was sent to the index
    #[error("document conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// The index rejected one of the rebuild steps; earlier steps are not undone
    #[error("index operation failed: {0}")]
    Index(#[from] IndexError),

    /// The record carries no usable identifier
    #[error("run record has no usable '{field}' identifier")]
    MissingIdentifier { field: String },
}
