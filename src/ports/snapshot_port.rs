//! Persistence port for the full ledger state.

use crate::domain::adjustment::MonthAdjustment;
use crate::domain::entry::{Entry, MAX_AMOUNT};
use crate::domain::error::LedgerError;
use std::collections::HashSet;

/// Everything a store persists: the entries plus the month adjustments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
    pub adjustments: Vec<MonthAdjustment>,
}

impl Snapshot {
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            adjustments: Vec::new(),
        }
    }
}

/// Loads and stores complete ledger snapshots. Each call acquires the backing
/// store for its own duration only.
pub trait SnapshotPort {
    /// Returns an empty snapshot when nothing has been saved yet. Unparseable
    /// data is reported as [`LedgerError::CorruptData`].
    fn load(&self) -> Result<Snapshot, LedgerError>;

    /// Replaces the stored snapshot.
    fn save(&self, entries: &[Entry], adjustments: &[MonthAdjustment]) -> Result<(), LedgerError>;

    /// Human-readable location for messages.
    fn location(&self) -> String;
}

/// Rejects snapshots that break ledger invariants: duplicate ids, negative
/// or oversized amounts, and adjustments for impossible or repeated months.
pub fn verify_snapshot(snapshot: &Snapshot, location: &str) -> Result<(), LedgerError> {
    let corrupt = |reason: String| LedgerError::CorruptData {
        location: location.to_string(),
        reason,
    };

    let mut seen = HashSet::with_capacity(snapshot.entries.len());
    for entry in &snapshot.entries {
        if !seen.insert(entry.id) {
            return Err(corrupt(format!("duplicate entry id {}", entry.id)));
        }
        if entry.amount.is_sign_negative() && !entry.amount.is_zero() {
            return Err(corrupt(format!(
                "entry {} has negative amount {}",
                entry.id, entry.amount
            )));
        }
        if entry.amount > MAX_AMOUNT {
            return Err(corrupt(format!(
                "entry {} amount {} exceeds the maximum of {}",
                entry.id, entry.amount, MAX_AMOUNT
            )));
        }
    }

    let mut months = HashSet::with_capacity(snapshot.adjustments.len());
    for adj in &snapshot.adjustments {
        if !months.insert(adj.key()) {
            return Err(corrupt(format!(
                "duplicate adjustment for {}-{:02}",
                adj.year, adj.month
            )));
        }
        MonthAdjustment::new(adj.year, adj.month, adj.rollover, adj.debt).map_err(|e| {
            corrupt(format!("adjustment {}-{:02}: {}", adj.year, adj.month, e))
        })?;
    }
    Ok(())
}
