//! Export port trait.

use crate::domain::entry::Entry;
use crate::domain::error::LedgerError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Port for writing entries to an external format.
pub trait ExportPort {
    /// Writes `entries` in the given order and returns the number of rows.
    fn write(&self, entries: &[&Entry], output: &mut dyn Write) -> Result<usize, LedgerError>;

    /// Default implementation: creates `path` and delegates to `write`.
    fn write_file(&self, entries: &[&Entry], path: &Path) -> Result<usize, LedgerError> {
        let file = File::create(path).map_err(|e| LedgerError::Export {
            reason: format!("failed to create {}: {}", path.display(), e),
        })?;
        let mut writer = BufWriter::new(file);
        let rows = self.write(entries, &mut writer)?;
        writer.flush()?;
        Ok(rows)
    }
}
