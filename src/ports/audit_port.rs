//! Decision audit log port trait.

use crate::domain::audit::DecisionRecord;
use crate::domain::error::IdxQuantError;

/// Append-only sink for decision records.
pub trait AuditPort {
    fn append(&self, records: &[DecisionRecord]) -> Result<(), IdxQuantError>;
}
