//! Index synchronization
//!
//! ```text
//! run engine ──RunObserver::run_completed──> IndexSynchronizer ──IndexClient──> index
//! ```

pub mod error;
pub mod ports;
pub mod synchronizer;

pub use error::SyncError;
pub use ports::RunObserver;
pub use synchronizer::{IndexSynchronizer, SyncOutcome};
