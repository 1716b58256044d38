//! In-memory ledger store. Holds the entry set; no persistence.

use crate::domain::adjustment::MonthAdjustment;
use crate::domain::entry::{Entry, EntryId, NewEntry};
use crate::domain::error::LedgerError;
use chrono::Datelike;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct Ledger {
    entries: Vec<Entry>,
    /// Sorted by (year, month), at most one per month, never all-zero.
    adjustments: Vec<MonthAdjustment>,
    next_id: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            adjustments: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuilds a ledger from a persisted snapshot. Ids continue after the
    /// largest one present.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let next_id = entries.iter().map(|e| e.id.0).max().unwrap_or(0) + 1;
        Self {
            entries,
            adjustments: Vec::new(),
            next_id,
        }
    }

    /// Restores persisted month adjustments. Later duplicates of a month win.
    pub fn with_adjustments(mut self, adjustments: Vec<MonthAdjustment>) -> Self {
        for adjustment in adjustments {
            self.set_adjustment(adjustment);
        }
        self
    }

    pub fn add(&mut self, entry: NewEntry) -> Result<EntryId, LedgerError> {
        let id = EntryId(self.next_id);
        let entry = entry.validate(id)?;
        self.entries.push(entry);
        self.next_id = id.0 + 1;
        Ok(id)
    }

    /// Full replacement of an existing entry; the id is kept.
    pub fn replace(&mut self, id: EntryId, entry: NewEntry) -> Result<(), LedgerError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(LedgerError::NotFound { id })?;
        *slot = entry.validate(id)?;
        Ok(())
    }

    pub fn remove(&mut self, id: EntryId) -> Result<Entry, LedgerError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(LedgerError::NotFound { id })?;
        Ok(self.entries.remove(index))
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Current entries in insertion order. The iterator is `Clone`, so it can
    /// be restarted; the borrow keeps it a stable snapshot.
    pub fn all(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sets the month's rollover and debt. An all-zero adjustment clears it.
    pub fn set_adjustment(&mut self, adjustment: MonthAdjustment) {
        let found = self
            .adjustments
            .binary_search_by_key(&adjustment.key(), MonthAdjustment::key);
        match found {
            Ok(i) if adjustment.is_zero() => {
                self.adjustments.remove(i);
            }
            Ok(i) => self.adjustments[i] = adjustment,
            Err(_) if adjustment.is_zero() => {}
            Err(i) => self.adjustments.insert(i, adjustment),
        }
    }

    pub fn adjustment(&self, year: i32, month: u32) -> Option<&MonthAdjustment> {
        self.adjustments
            .binary_search_by_key(&(year, month), MonthAdjustment::key)
            .ok()
            .map(|i| &self.adjustments[i])
    }

    pub fn adjustments(&self) -> &[MonthAdjustment] {
        &self.adjustments
    }

    /// Drops every entry dated in the month along with its adjustment.
    /// Returns the removed entries. Ids stay consumed.
    pub fn clear_month(&mut self, year: i32, month: u32) -> Vec<Entry> {
        let (removed, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.date.year() == year && e.date.month() == month);
        self.entries = kept;
        self.adjustments.retain(|a| a.key() != (year, month));
        removed
    }

    /// Years that have at least one entry, ascending.
    pub fn years(&self) -> BTreeSet<i32> {
        self.entries.iter().map(|e| e.date.year()).collect()
    }

    /// Entries sorted by date, then id.
    pub fn sorted(&self) -> Vec<&Entry> {
        let mut sorted: Vec<&Entry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| (e.date, e.id));
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::Category;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .add(NewEntry::new(date(2024, 1, 5), Category::Income, dec!(3000)).with_label("salary"))
            .unwrap();
        ledger
            .add(NewEntry::new(date(2024, 1, 10), Category::Expense, dec!(1200)).with_label("rent"))
            .unwrap();
        ledger
            .add(NewEntry::new(date(2023, 12, 15), Category::Bill, dec!(80)).with_label("electric"))
            .unwrap();
        ledger
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let ledger = sample_ledger();
        let ids: Vec<u64> = ledger.all().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn add_rejects_invalid_without_state_change() {
        let mut ledger = sample_ledger();
        let result = ledger.add(NewEntry::new(date(2024, 2, 1), Category::Bill, dec!(-5)));
        assert!(matches!(result, Err(LedgerError::Validation { .. })));
        assert_eq!(ledger.len(), 3);

        // A failed add does not consume an id.
        let id = ledger
            .add(NewEntry::new(date(2024, 2, 1), Category::Bill, dec!(5)))
            .unwrap();
        assert_eq!(id, EntryId(4));
    }

    #[test]
    fn remove_existing_entry() {
        let mut ledger = sample_ledger();
        let removed = ledger.remove(EntryId(2)).unwrap();
        assert_eq!(removed.label, "rent");
        assert_eq!(ledger.len(), 2);
        assert!(ledger.get(EntryId(2)).is_none());
    }

    #[test]
    fn remove_missing_entry_leaves_ledger_unchanged() {
        let mut ledger = sample_ledger();
        let before = ledger.entries().to_vec();
        let result = ledger.remove(EntryId(99));
        assert!(matches!(result, Err(LedgerError::NotFound { id }) if id == EntryId(99)));
        assert_eq!(ledger.entries(), before.as_slice());
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut ledger = sample_ledger();
        ledger.remove(EntryId(3)).unwrap();
        let id = ledger
            .add(NewEntry::new(date(2024, 3, 1), Category::Savings, dec!(100)))
            .unwrap();
        assert_eq!(id, EntryId(4));
    }

    #[test]
    fn replace_keeps_id() {
        let mut ledger = sample_ledger();
        ledger
            .replace(
                EntryId(2),
                NewEntry::new(date(2024, 1, 11), Category::Bill, dec!(1250)).with_label("rent"),
            )
            .unwrap();
        let entry = ledger.get(EntryId(2)).unwrap();
        assert_eq!(entry.category, Category::Bill);
        assert_eq!(entry.amount, dec!(1250));
        assert_eq!(entry.date, date(2024, 1, 11));
    }

    #[test]
    fn replace_missing_or_invalid_fails() {
        let mut ledger = sample_ledger();
        assert!(matches!(
            ledger.replace(EntryId(9), NewEntry::new(date(2024, 1, 1), Category::Bill, dec!(1))),
            Err(LedgerError::NotFound { .. })
        ));
        let invalid = NewEntry {
            amount: None,
            ..NewEntry::new(date(2024, 1, 1), Category::Bill, dec!(1))
        };
        assert!(matches!(
            ledger.replace(EntryId(1), invalid),
            Err(LedgerError::Validation { .. })
        ));
        assert_eq!(ledger.get(EntryId(1)).unwrap().label, "salary");
    }

    #[test]
    fn all_is_restartable() {
        let ledger = sample_ledger();
        let iter = ledger.all();
        let first: Vec<_> = iter.clone().map(|e| e.id).collect();
        let second: Vec<_> = iter.map(|e| e.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn from_entries_continues_ids() {
        let ledger = sample_ledger();
        let mut restored = Ledger::from_entries(ledger.entries().to_vec());
        let id = restored
            .add(NewEntry::new(date(2024, 4, 1), Category::Income, dec!(1)))
            .unwrap();
        assert_eq!(id, EntryId(4));
    }

    #[test]
    fn default_starts_ids_at_one() {
        let mut ledger = Ledger::default();
        let id = ledger
            .add(NewEntry::new(date(2024, 1, 1), Category::Income, dec!(1)))
            .unwrap();
        assert_eq!(id, EntryId(1));
    }

    #[test]
    fn from_empty_snapshot_starts_ids_at_one() {
        let mut ledger = Ledger::from_entries(Vec::new());
        let id = ledger
            .add(NewEntry::new(date(2024, 1, 1), Category::Income, dec!(1)))
            .unwrap();
        assert_eq!(id, EntryId(1));
    }

    #[test]
    fn set_adjustment_replaces_and_clears() {
        let mut ledger = Ledger::new();
        ledger.set_adjustment(MonthAdjustment::new(2024, 3, dec!(100), dec!(0)).unwrap());
        ledger.set_adjustment(MonthAdjustment::new(2024, 1, dec!(0), dec!(20)).unwrap());
        ledger.set_adjustment(MonthAdjustment::new(2024, 3, dec!(150), dec!(5)).unwrap());

        let keys: Vec<_> = ledger.adjustments().iter().map(|a| a.key()).collect();
        assert_eq!(keys, vec![(2024, 1), (2024, 3)]);
        assert_eq!(ledger.adjustment(2024, 3).unwrap().rollover, dec!(150));
        assert!(ledger.adjustment(2024, 2).is_none());

        ledger.set_adjustment(MonthAdjustment::new(2024, 3, dec!(0), dec!(0)).unwrap());
        assert!(ledger.adjustment(2024, 3).is_none());
        assert_eq!(ledger.adjustments().len(), 1);
    }

    #[test]
    fn clear_month_removes_entries_and_adjustment() {
        let mut ledger = sample_ledger();
        ledger.set_adjustment(MonthAdjustment::new(2024, 1, dec!(10), dec!(0)).unwrap());
        ledger.set_adjustment(MonthAdjustment::new(2023, 12, dec!(5), dec!(0)).unwrap());

        let removed = ledger.clear_month(2024, 1);
        let labels: Vec<_> = removed.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["salary", "rent"]);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.adjustment(2024, 1).is_none());
        assert!(ledger.adjustment(2023, 12).is_some());

        let id = ledger
            .add(NewEntry::new(date(2024, 1, 2), Category::Income, dec!(1)))
            .unwrap();
        assert_eq!(id, EntryId(4));
    }

    #[test]
    fn clear_empty_month_changes_nothing() {
        let mut ledger = sample_ledger();
        assert!(ledger.clear_month(2020, 6).is_empty());
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn years_and_sorted() {
        let ledger = sample_ledger();
        assert_eq!(ledger.years().into_iter().collect::<Vec<_>>(), vec![2023, 2024]);
        let dates: Vec<_> = ledger.sorted().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2023, 12, 15), date(2024, 1, 5), date(2024, 1, 10)]);
    }
}
