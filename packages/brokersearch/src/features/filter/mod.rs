//! Inclusion filters
//!
//! ```text
//! query document (YAML / JSON)
//!      ↓ parser.rs
//! FilterExpr tree  ──evaluate(RunRecord)──> bool
//! ```

pub mod expression;
pub mod parser;

pub use expression::{FilterExpr, InclusionFilter};
pub use parser::FilterParseError;
