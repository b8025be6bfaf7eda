//! Document mapping
//!
//! # Architecture
//!
//! ```text
//! converters.rs    (Converter)        value → Option<value>
//!      ↓
//! document_map.rs  (DocumentMap)      ordered (source, target, converter) rows
//!      ↓
//! transformer.rs   (DocumentTransformer) RunRecord → NormalizedDocument
//! ```

pub mod converters;
pub mod document_map;
pub mod error;
pub mod transformer;

pub use converters::{epoch_to_iso, Converter, DateZone};
pub use document_map::{DocumentMap, DocumentMapBuilder, FieldMapping};
pub use error::ConversionError;
pub use transformer::DocumentTransformer;
