//! Feature modules
//!
//! ```text
//! mapping ──> sync ──> index <── lookup
//! filter  ──┘
//! ```

pub mod filter;
pub mod index;
pub mod lookup;
pub mod mapping;
pub mod sync;
