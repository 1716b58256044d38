//! A ledger paired with its snapshot store for one run of the program.
//!
//! Every successful mutation is followed by a full snapshot save. The
//! [`Ledger`] itself never touches storage.

use crate::domain::adjustment::MonthAdjustment;
use crate::domain::entry::{Entry, EntryId, NewEntry};
use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::ports::snapshot_port::SnapshotPort;

pub struct Session<'a> {
    ledger: Ledger,
    store: &'a dyn SnapshotPort,
    /// Set when a mutation is applied in memory but not yet saved.
    dirty: bool,
}

impl<'a> Session<'a> {
    /// Loads the snapshot. An unreadable snapshot is not fatal: the session
    /// starts empty and the [`LedgerError::CorruptData`] is handed back as a
    /// warning. The next save overwrites the bad snapshot.
    pub fn open(store: &'a dyn SnapshotPort) -> Result<(Self, Option<LedgerError>), LedgerError> {
        let (ledger, warning) = match store.load() {
            Ok(snapshot) => (
                Ledger::from_entries(snapshot.entries).with_adjustments(snapshot.adjustments),
                None,
            ),
            Err(err @ LedgerError::CorruptData { .. }) => {
                tracing::warn!(location = %store.location(), error = %err, "starting with an empty ledger");
                (Ledger::new(), Some(err))
            }
            Err(err) => return Err(err),
        };
        Ok((
            Self {
                ledger,
                store,
                dirty: false,
            },
            warning,
        ))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Validation failures leave both memory and storage untouched. A save
    /// failure is returned with the mutation already applied in memory.
    pub fn add(&mut self, entry: NewEntry) -> Result<EntryId, LedgerError> {
        let id = self.ledger.add(entry)?;
        self.persist()?;
        Ok(id)
    }

    pub fn replace(&mut self, id: EntryId, entry: NewEntry) -> Result<(), LedgerError> {
        self.ledger.replace(id, entry)?;
        self.persist()
    }

    pub fn remove(&mut self, id: EntryId) -> Result<Entry, LedgerError> {
        let removed = self.ledger.remove(id)?;
        self.persist()?;
        Ok(removed)
    }

    /// Adds entries one at a time. Stops at the first invalid entry; the ones
    /// before it stay added and saved.
    pub fn import(&mut self, entries: Vec<NewEntry>) -> Result<Vec<EntryId>, LedgerError> {
        entries.into_iter().map(|entry| self.add(entry)).collect()
    }

    pub fn set_adjustment(&mut self, adjustment: MonthAdjustment) -> Result<(), LedgerError> {
        self.ledger.set_adjustment(adjustment);
        self.persist()
    }

    /// Deletes the month's entries and adjustment. Returns the removed entries.
    pub fn reset_month(&mut self, year: i32, month: u32) -> Result<Vec<Entry>, LedgerError> {
        let removed = self.ledger.clear_month(year, month);
        self.persist()?;
        Ok(removed)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn save(&mut self) -> Result<(), LedgerError> {
        self.store
            .save(self.ledger.entries(), self.ledger.adjustments())?;
        self.dirty = false;
        Ok(())
    }

    /// Ends the session, retrying the save if the last one failed.
    pub fn close(mut self) -> Result<Ledger, LedgerError> {
        if self.dirty {
            self.save()?;
        }
        Ok(self.ledger)
    }

    fn persist(&mut self) -> Result<(), LedgerError> {
        self.dirty = true;
        self.save()
    }
}
