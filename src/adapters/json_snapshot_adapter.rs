//! JSON snapshot file adapter.

use crate::domain::adjustment::MonthAdjustment;
use crate::domain::entry::Entry;
use crate::domain::error::LedgerError;
use crate::ports::snapshot_port::{Snapshot, SnapshotPort, verify_snapshot};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    entries: &'a [Entry],
    adjustments: &'a [MonthAdjustment],
}

/// Unknown top-level keys and entry fields are ignored so that files written
/// by newer versions still load.
#[derive(Deserialize)]
struct SnapshotIn {
    #[serde(default)]
    version: u32,
    entries: Vec<Entry>,
    #[serde(default)]
    adjustments: Vec<MonthAdjustment>,
}

pub struct JsonSnapshotAdapter {
    path: PathBuf,
}

impl JsonSnapshotAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotPort for JsonSnapshotAdapter {
    fn load(&self) -> Result<Snapshot, LedgerError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no snapshot yet, starting empty");
            return Ok(Snapshot::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| LedgerError::Storage {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let snapshot: SnapshotIn =
            serde_json::from_str(&content).map_err(|e| LedgerError::CorruptData {
                location: self.location(),
                reason: e.to_string(),
            })?;

        if snapshot.version > SNAPSHOT_VERSION {
            tracing::warn!(
                version = snapshot.version,
                "snapshot written by a newer version, reading known fields only"
            );
        }

        let snapshot = Snapshot {
            entries: snapshot.entries,
            adjustments: snapshot.adjustments,
        };
        verify_snapshot(&snapshot, &self.location())?;
        tracing::debug!(
            path = %self.path.display(),
            entries = snapshot.entries.len(),
            adjustments = snapshot.adjustments.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    fn save(&self, entries: &[Entry], adjustments: &[MonthAdjustment]) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LedgerError::Storage {
                reason: format!("failed to create {}: {}", parent.display(), e),
            })?;
        }

        let temp = self.temp_path();
        {
            let file = File::create(&temp).map_err(|e| LedgerError::Storage {
                reason: format!("failed to create {}: {}", temp.display(), e),
            })?;
            let mut writer = BufWriter::new(file);
            let snapshot = SnapshotOut {
                version: SNAPSHOT_VERSION,
                entries,
                adjustments,
            };
            serde_json::to_writer_pretty(&mut writer, &snapshot).map_err(|e| {
                LedgerError::Storage {
                    reason: format!("failed to encode snapshot: {}", e),
                }
            })?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        fs::rename(&temp, &self.path).map_err(|e| LedgerError::Storage {
            reason: format!("failed to replace {}: {}", self.path.display(), e),
        })?;

        tracing::debug!(path = %self.path.display(), entries = entries.len(), "snapshot saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
