//! Record-store Port
//!
//! The archive of full run records lives outside this crate. Lookups only need
//! to resolve one identifier at a time.

use super::error::LookupError;
use crate::shared::models::RunRecord;

pub trait RecordStore {
    /// Fetch the full record for `uid`
    fn resolve(&self, uid: &str) -> Result<RunRecord, LookupError>;
}
