//! Append-only JSON audit log.
//!
//! The file holds one pretty-printed JSON array of decision records. Each
//! append reads the array, extends it and rewrites the file through a
//! sibling temp file. A missing, empty or corrupt file counts as an empty
//! log; a file that cannot be read at all aborts the append.

use crate::domain::audit::DecisionRecord;
use crate::domain::error::IdxQuantError;
use crate::ports::audit_port::AuditPort;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct JsonAuditLog {
    path: PathBuf,
}

impl JsonAuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Everything logged so far. A missing file or one that is not a JSON
    /// array of records reads as an empty log. Any other read failure is an
    /// `Audit` error.
    pub fn read_all(&self) -> Result<Vec<DecisionRecord>, IdxQuantError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(IdxQuantError::Audit {
                    reason: format!("cannot read {}: {}", self.path.display(), e),
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&content) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "audit log unreadable, starting a new one");
                Ok(Vec::new())
            }
        }
    }
}

impl AuditPort for JsonAuditLog {
    fn append(&self, records: &[DecisionRecord]) -> Result<(), IdxQuantError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut all = self.read_all()?;
        all.extend_from_slice(records);
        let body = serde_json::to_string_pretty(&all)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IdxQuantError::Audit {
                reason: format!("cannot create {}: {}", parent.display(), e),
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| IdxQuantError::Audit {
                reason: format!("cannot write {}: {}", self.path.display(), e),
            })?;

        tracing::debug!(path = %self.path.display(), appended = records.len(), total = all.len(), "audit log updated");
        Ok(())
    }
}
