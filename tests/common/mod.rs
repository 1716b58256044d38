#![allow(dead_code)]

use chrono::NaiveDate;
use ledgerbook::domain::adjustment::MonthAdjustment;
use ledgerbook::domain::entry::{Category, Entry, NewEntry};
use ledgerbook::domain::error::LedgerError;
use ledgerbook::domain::ledger::Ledger;
use ledgerbook::ports::snapshot_port::{Snapshot, SnapshotPort};
use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::str::FromStr;

/// In-memory snapshot store with failure injection.
#[derive(Default)]
pub struct MockSnapshotPort {
    pub saved: RefCell<Snapshot>,
    pub save_count: Cell<usize>,
    pub load_error: Option<String>,
    pub fail_saves: Cell<bool>,
}

impl MockSnapshotPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<Entry>) -> Self {
        let port = Self::default();
        *port.saved.borrow_mut() = Snapshot::from_entries(entries);
        port
    }

    pub fn corrupt(reason: &str) -> Self {
        Self {
            load_error: Some(reason.to_string()),
            ..Self::default()
        }
    }
}

impl SnapshotPort for MockSnapshotPort {
    fn load(&self) -> Result<Snapshot, LedgerError> {
        if let Some(reason) = &self.load_error {
            return Err(LedgerError::CorruptData {
                location: self.location(),
                reason: reason.clone(),
            });
        }
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, entries: &[Entry], adjustments: &[MonthAdjustment]) -> Result<(), LedgerError> {
        if self.fail_saves.get() {
            return Err(LedgerError::Storage {
                reason: "disk full".into(),
            });
        }
        *self.saved.borrow_mut() = Snapshot {
            entries: entries.to_vec(),
            adjustments: adjustments.to_vec(),
        };
        self.save_count.set(self.save_count.get() + 1);
        Ok(())
    }

    fn location(&self) -> String {
        "mock".to_string()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn amount(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn new_entry(d: &str, category: Category, label: &str, value: &str) -> NewEntry {
    NewEntry::new(
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
        category,
        amount(value),
    )
    .with_label(label)
}

/// salary 3000, rent 1200, electric 80 in January 2024.
pub fn january_entries() -> Vec<NewEntry> {
    vec![
        new_entry("2024-01-05", Category::Income, "salary", "3000"),
        new_entry("2024-01-10", Category::Expense, "rent", "1200"),
        new_entry("2024-01-15", Category::Bill, "electric", "80"),
    ]
}

pub fn ledger_with(entries: Vec<NewEntry>) -> Ledger {
    let mut ledger = Ledger::new();
    for entry in entries {
        ledger.add(entry).unwrap();
    }
    ledger
}
