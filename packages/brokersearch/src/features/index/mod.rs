//! Search index port
//!
//! ```text
//! ports.rs           IndexClient trait, IndexOp, ScanRequest / IndexHit / InsertAction
//! schema.rs          IndexSchema field-type declarations
//! error.rs           IndexError + IndexErrorKind
//! infrastructure/    InMemoryIndex (journaling test double) + query-string subset
//! ```

pub mod error;
pub mod infrastructure;
pub mod ports;
pub mod schema;

pub use error::{IndexError, IndexErrorKind, IndexResult};
pub use infrastructure::{InMemoryIndex, IndexCall};
pub use ports::{
    HitStream, IndexClient, IndexHit, IndexOp, InsertAction, ScanRequest, DEFAULT_SCAN_PAGE_SIZE,
};
pub use schema::{DateFormat, FieldDeclaration, FieldKind, IndexSchema};
