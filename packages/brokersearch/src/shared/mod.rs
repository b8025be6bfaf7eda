//! Shared models used by every feature slice

pub mod models;

pub use models::{NormalizedDocument, RecordId, RunRecord};
