//! brokersearch - run metadata mirrored into a search index, and back
//!
//! ```text
//!                 ┌──────────────────── DeploymentProfile ───────────────────┐
//!                 │  InclusionFilter     DocumentMap        IndexSchema      │
//!                 └──────┬──────────────────┬─────────────────────┬──────────┘
//!                        ▼                  ▼                     ▼
//! run engine ──> RunRecord ──accept?──> DocumentTransformer ──> IndexSynchronizer
//!                                                                 │ delete, create,
//!                                                                 │ put_schema, insert
//!                                                                 ▼
//! user query ──> ReverseLookup ──scan(id field)──────────────> IndexClient
//!                     │
//!                     ▼
//!               LookupResults ──RecordHandle::resolve──> RecordStore
//! ```
//!
//! ## Core Rules
//!
//! 1. **Full replace**: every accepted run rebuilds its index around one document
//! 2. **Identifier round trip**: the run's `uid` is both the document id and a
//!    document field, so index hits lead back to the archived record
//! 3. **Fail fast**: malformed filters fail at profile load, malformed values
//!    abort the sync before any index call
//!
//! ## Usage
//!
//! ```rust
//! use brokersearch::{IndexSynchronizer, InMemoryIndex, ProfileRegistry, RunRecord};
//! use serde_json::json;
//!
//! let registry = ProfileRegistry::builtin().unwrap();
//! let profile = registry.get("xpd").unwrap();
//! let index = InMemoryIndex::new();
//!
//! let record = RunRecord::from_value(json!({"uid": "u-1", "bt_piLast": "Billinge"})).unwrap();
//! let outcome = IndexSynchronizer::new(profile, &index).sync(&record).unwrap();
//! assert!(outcome.is_replaced());
//! ```

pub mod config;
pub mod features;
pub mod shared;

pub use config::{BuiltinProfile, ConfigError, DeploymentProfile, ProfileRegistry};
pub use features::filter::{FilterExpr, InclusionFilter};
pub use features::index::{IndexClient, IndexError, IndexSchema, InMemoryIndex};
pub use features::lookup::{InMemoryRecordStore, LookupResults, RecordHandle, RecordStore, ReverseLookup};
pub use features::mapping::{Converter, DocumentMap, DocumentTransformer};
pub use features::sync::{IndexSynchronizer, RunObserver, SyncError, SyncOutcome};
pub use shared::models::{NormalizedDocument, RecordId, RunRecord};
