//! Reverse lookup from index queries to run records
//!
//! ```text
//! reverse_lookup.rs   ReverseLookup::search(query) ──> LookupResults
//! results.rs          LookupResults / RecordHandle (lazy, single pass)
//! ports.rs            RecordStore trait
//! infrastructure/     InMemoryRecordStore
//! ```

pub mod error;
pub mod infrastructure;
pub mod ports;
pub mod results;
pub mod reverse_lookup;

pub use error::LookupError;
pub use infrastructure::InMemoryRecordStore;
pub use ports::RecordStore;
pub use results::{LookupResults, RecordHandle, RecordPair};
pub use reverse_lookup::ReverseLookup;
