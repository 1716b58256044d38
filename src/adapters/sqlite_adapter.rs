//! SQLite snapshot adapter.

use crate::domain::adjustment::MonthAdjustment;
use crate::domain::entry::{Category, Entry, EntryId};
use crate::domain::error::LedgerError;
use crate::ports::snapshot_port::{Snapshot, SnapshotPort, verify_snapshot};
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

type StoredRow = (i64, String, String, String, String, bool);
type StoredAdjustment = (i32, u32, String, String);

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
    location: String,
}

impl SqliteAdapter {
    pub fn open(path: &Path, pool_size: u32) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LedgerError::Storage {
                reason: format!("failed to create {}: {}", parent.display(), e),
            })?;
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        let adapter = Self {
            pool,
            location: path.display().to_string(),
        };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, LedgerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        let adapter = Self {
            pool,
            location: ":memory:".to_string(),
        };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn connection(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, LedgerError> {
        self.pool.get().map_err(|e: r2d2::Error| LedgerError::Storage {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), LedgerError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                label TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL,
                paid INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date);
            CREATE TABLE IF NOT EXISTS adjustments (
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                rollover TEXT NOT NULL DEFAULT '0',
                debt TEXT NOT NULL DEFAULT '0',
                PRIMARY KEY (year, month)
            );",
        )
        .map_err(|e: rusqlite::Error| LedgerError::Storage {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn corrupt(&self, reason: String) -> LedgerError {
        LedgerError::CorruptData {
            location: self.location.clone(),
            reason,
        }
    }

    fn decode_row(&self, row: StoredRow) -> Result<Entry, LedgerError> {
        let (id, date_str, category, label, amount_str, paid) = row;
        let id = u64::try_from(id).map_err(|_| self.corrupt(format!("invalid id {}", id)))?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| self.corrupt(format!("entry {}: invalid date '{}': {}", id, date_str, e)))?;
        let amount = Decimal::from_str(&amount_str).map_err(|e| {
            self.corrupt(format!("entry {}: invalid amount '{}': {}", id, amount_str, e))
        })?;
        Ok(Entry {
            id: EntryId(id),
            date,
            category: Category::from_stored(&category),
            label,
            amount,
            paid,
        })
    }

    fn decode_adjustment(&self, row: StoredAdjustment) -> Result<MonthAdjustment, LedgerError> {
        let (year, month, rollover_str, debt_str) = row;
        let decimal = |value: &str, name: &str| {
            Decimal::from_str(value).map_err(|e| {
                self.corrupt(format!(
                    "adjustment {}-{:02}: invalid {} '{}': {}",
                    year, month, name, value, e
                ))
            })
        };
        Ok(MonthAdjustment {
            year,
            month,
            rollover: decimal(&rollover_str, "rollover")?,
            debt: decimal(&debt_str, "debt")?,
        })
    }

    fn load_adjustments(
        &self,
        conn: &rusqlite::Connection,
    ) -> Result<Vec<MonthAdjustment>, LedgerError> {
        let mut stmt = conn
            .prepare("SELECT year, month, rollover, debt FROM adjustments ORDER BY year, month")
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| -> rusqlite::Result<StoredAdjustment> {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        let mut adjustments = Vec::new();
        for row in rows {
            let row = row.map_err(|e: rusqlite::Error| self.corrupt(e.to_string()))?;
            adjustments.push(self.decode_adjustment(row)?);
        }
        Ok(adjustments)
    }
}

impl SnapshotPort for SqliteAdapter {
    fn load(&self) -> Result<Snapshot, LedgerError> {
        let conn = self.connection()?;

        let mut stmt = conn
            .prepare("SELECT id, date, category, label, amount, paid FROM entries ORDER BY id")
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| -> rusqlite::Result<StoredRow> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            })
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        let mut entries = Vec::new();
        for row in rows {
            let row = row.map_err(|e: rusqlite::Error| self.corrupt(e.to_string()))?;
            entries.push(self.decode_row(row)?);
        }

        let snapshot = Snapshot {
            entries,
            adjustments: self.load_adjustments(&conn)?,
        };
        verify_snapshot(&snapshot, &self.location)?;
        tracing::debug!(
            location = %self.location,
            entries = snapshot.entries.len(),
            adjustments = snapshot.adjustments.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    fn save(&self, entries: &[Entry], adjustments: &[MonthAdjustment]) -> Result<(), LedgerError> {
        let mut conn = self.connection()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        tx.execute_batch("DELETE FROM entries; DELETE FROM adjustments;")
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        for entry in entries {
            tx.execute(
                "INSERT INTO entries (id, date, category, label, amount, paid)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.id.0 as i64,
                    entry.date.format("%Y-%m-%d").to_string(),
                    entry.category.as_str(),
                    entry.label,
                    entry.amount.to_string(),
                    entry.paid
                ],
            )
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;
        }

        for adj in adjustments {
            tx.execute(
                "INSERT INTO adjustments (year, month, rollover, debt) VALUES (?1, ?2, ?3, ?4)",
                params![adj.year, adj.month, adj.rollover.to_string(), adj.debt.to_string()],
            )
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        tracing::debug!(location = %self.location, entries = entries.len(), "snapshot saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}
