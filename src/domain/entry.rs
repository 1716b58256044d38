//! Ledger entry representation and input validation.

use crate::domain::error::LedgerError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest accepted amount, 10^15. Sums of bounded amounts stay well inside
/// the range of [`Decimal`], so aggregation never overflows.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// What an entry does to the balance. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Income,
    Expense,
    Bill,
    Savings,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Income,
        Category::Expense,
        Category::Bill,
        Category::Savings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Income => "income",
            Category::Expense => "expense",
            Category::Bill => "bill",
            Category::Savings => "savings",
        }
    }

    /// Income and savings add to the balance, expenses and bills subtract.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Category::Income | Category::Savings => amount,
            Category::Expense | Category::Bill => -amount,
        }
    }

    /// Lenient parse for persisted data: unknown values are read as
    /// [`Category::Expense`].
    pub fn from_stored(value: &str) -> Category {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(category = value, "unknown category in stored data, treating as expense");
            Category::Expense
        })
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Category::from_stored(&value))
    }
}

impl FromStr for Category {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Category::Income),
            "expense" | "expenses" => Ok(Category::Expense),
            "bill" | "bills" => Ok(Category::Bill),
            "savings" | "saving" => Ok(Category::Savings),
            other => Err(LedgerError::validation(
                "category",
                format!("unknown category '{other}' (expected income, expense, bill or savings)"),
            )),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub category: Category,
    #[serde(default)]
    pub label: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub paid: bool,
}

impl Entry {
    pub fn signed_amount(&self) -> Decimal {
        self.category.signed(self.amount)
    }
}

/// Unvalidated user input for creating or replacing an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEntry {
    pub date: Option<NaiveDate>,
    pub category: Option<Category>,
    pub label: Option<String>,
    pub amount: Option<Decimal>,
    pub paid: bool,
}

impl NewEntry {
    pub fn new(date: NaiveDate, category: Category, amount: Decimal) -> Self {
        Self {
            date: Some(date),
            category: Some(category),
            label: None,
            amount: Some(amount),
            paid: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_paid(mut self, paid: bool) -> Self {
        self.paid = paid;
        self
    }

    /// Checks required fields and builds the stored form under `id`.
    pub fn validate(self, id: EntryId) -> Result<Entry, LedgerError> {
        let date = self
            .date
            .ok_or_else(|| LedgerError::validation("date", "date is required"))?;
        let category = self
            .category
            .ok_or_else(|| LedgerError::validation("category", "category is required"))?;
        let amount = self
            .amount
            .ok_or_else(|| LedgerError::validation("amount", "amount is required"))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(LedgerError::validation(
                "amount",
                format!("amount must be non-negative, got {amount}"),
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(LedgerError::validation(
                "amount",
                format!("amount {amount} exceeds the maximum of {MAX_AMOUNT}"),
            ));
        }

        Ok(Entry {
            id,
            date,
            category,
            label: self.label.map(|l| l.trim().to_string()).unwrap_or_default(),
            amount: amount.normalize(),
            paid: self.paid,
        })
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        LedgerError::validation("date", format!("invalid date '{value}', expected YYYY-MM-DD"))
    })
}

pub fn parse_amount(value: &str) -> Result<Decimal, LedgerError> {
    Decimal::from_str(value.trim())
        .map_err(|e| LedgerError::validation("amount", format!("invalid amount '{value}': {e}")))
}
