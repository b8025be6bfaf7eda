//! Index adapters

pub mod memory_index;
pub mod query;

pub use memory_index::{InMemoryIndex, IndexCall};
pub use query::QueryString;
