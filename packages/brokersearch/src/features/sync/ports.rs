//! Run-engine Port
//!
//! The run engine's dispatch mechanism is external. It calls one observer at a
//! time, once per completed run, and waits for the call to return.

use super::error::SyncError;
use crate::shared::models::RunRecord;

/// Receives run records as runs complete
pub trait RunObserver {
    fn run_completed(&self, record: &RunRecord) -> Result<(), SyncError>;
}
