//! Per-month rollover and debt payment, kept beside the entry list.

use crate::domain::entry::MAX_AMOUNT;
use crate::domain::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthAdjustment {
    pub year: i32,
    pub month: u32,
    /// Carried in from the previous month. May be negative.
    #[serde(default, with = "rust_decimal::serde::str")]
    pub rollover: Decimal,
    /// Debt paid off during the month.
    #[serde(default, with = "rust_decimal::serde::str")]
    pub debt: Decimal,
}

impl MonthAdjustment {
    pub fn new(year: i32, month: u32, rollover: Decimal, debt: Decimal) -> Result<Self, LedgerError> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::validation(
                "month",
                format!("month must be 1-12, got {month}"),
            ));
        }
        if rollover.abs() > MAX_AMOUNT {
            return Err(LedgerError::validation(
                "rollover",
                format!("rollover {rollover} exceeds the maximum of {MAX_AMOUNT}"),
            ));
        }
        if debt.is_sign_negative() && !debt.is_zero() {
            return Err(LedgerError::validation(
                "debt",
                format!("debt must be non-negative, got {debt}"),
            ));
        }
        if debt > MAX_AMOUNT {
            return Err(LedgerError::validation(
                "debt",
                format!("debt {debt} exceeds the maximum of {MAX_AMOUNT}"),
            ));
        }

        Ok(Self {
            year,
            month,
            rollover: rollover.normalize(),
            debt: debt.normalize(),
        })
    }

    pub fn key(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    pub fn is_zero(&self) -> bool {
        self.rollover.is_zero() && self.debt.is_zero()
    }

    /// Effect on what is left for the month: rollover adds, debt subtracts.
    pub fn signed(&self) -> Decimal {
        self.rollover - self.debt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_normalizes_amounts() {
        let adj = MonthAdjustment::new(2024, 3, dec!(150.00), dec!(40.50)).unwrap();
        assert_eq!(adj.rollover, dec!(150));
        assert_eq!(adj.debt, dec!(40.5));
        assert_eq!(adj.signed(), dec!(109.5));
        assert_eq!(adj.key(), (2024, 3));
    }

    #[test]
    fn negative_rollover_is_allowed() {
        let adj = MonthAdjustment::new(2024, 1, dec!(-75), dec!(0)).unwrap();
        assert_eq!(adj.signed(), dec!(-75));
        assert!(!adj.is_zero());
    }

    #[test]
    fn rejects_bad_month_and_debt() {
        assert!(matches!(
            MonthAdjustment::new(2024, 0, dec!(1), dec!(0)),
            Err(LedgerError::Validation { field, .. }) if field == "month"
        ));
        assert!(matches!(
            MonthAdjustment::new(2024, 13, dec!(1), dec!(0)),
            Err(LedgerError::Validation { field, .. }) if field == "month"
        ));
        assert!(matches!(
            MonthAdjustment::new(2024, 5, dec!(0), dec!(-1)),
            Err(LedgerError::Validation { field, .. }) if field == "debt"
        ));
    }

    #[test]
    fn rejects_amounts_above_maximum() {
        assert!(matches!(
            MonthAdjustment::new(2024, 5, -Decimal::MAX, dec!(0)),
            Err(LedgerError::Validation { field, .. }) if field == "rollover"
        ));
        assert!(matches!(
            MonthAdjustment::new(2024, 5, dec!(0), Decimal::MAX),
            Err(LedgerError::Validation { field, .. }) if field == "debt"
        ));
    }

    #[test]
    fn json_defaults_missing_amounts() {
        let adj: MonthAdjustment = serde_json::from_str(r#"{"year":2024,"month":2,"debt":"25"}"#).unwrap();
        assert_eq!(adj.rollover, Decimal::ZERO);
        assert_eq!(adj.debt, dec!(25));
        let json = serde_json::to_value(adj).unwrap();
        assert_eq!(json["rollover"], "0");
    }
}
