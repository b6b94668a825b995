//! Append-only transaction log.

use crate::error::Result;
use crate::types::TransactionEntry;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// The canonical log header, in persisted order.
pub const LOG_COLUMNS: [&str; 6] = [
    "timestamp",
    "product_id",
    "product_name",
    "action",
    "amount",
    "new_total",
];

/// Append-only history of stock-changing events.
///
/// Rows are never rewritten or compacted; ordering is insertion order.
/// No locking is performed here — serializing writers is the service's
/// responsibility.
pub struct TransactionLog {
    path: PathBuf,
}

impl TransactionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append exactly one row, creating the file with its canonical header
    /// first when it does not exist yet.
    pub fn append(&self, entry: &TransactionEntry) -> Result<()> {
        let fresh = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if fresh {
            writer.write_record(LOG_COLUMNS)?;
        }
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }

    /// Full history, oldest first. A log that was never written reads as
    /// empty rather than failing.
    pub fn read_all(&self) -> Result<Vec<TransactionEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut entries = Vec::new();
        for row in reader.deserialize() {
            entries.push(row?);
        }
        Ok(entries)
    }
}
