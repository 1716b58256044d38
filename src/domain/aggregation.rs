//! Month/year rollups, category totals and running balances.
//!
//! Every function here is a pure function of the ledger snapshot it is
//! given. Amounts are summed as [`Decimal`], so repeated aggregation is exact
//! to the cent. Entry amounts are capped at
//! [`MAX_AMOUNT`](crate::domain::entry::MAX_AMOUNT), which keeps the
//! sums clear of `Decimal` overflow.

use crate::domain::adjustment::MonthAdjustment;
use crate::domain::entry::{Category, Entry};
use crate::domain::ledger::Ledger;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub bills: Decimal,
    pub savings: Decimal,
    pub net: Decimal,
    pub rollover: Decimal,
    pub debt: Decimal,
    /// `net + rollover - debt`
    pub left: Decimal,
}

impl MonthlySummary {
    pub fn zero(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            bills: Decimal::ZERO,
            savings: Decimal::ZERO,
            net: Decimal::ZERO,
            rollover: Decimal::ZERO,
            debt: Decimal::ZERO,
            left: Decimal::ZERO,
        }
    }

    fn accumulate(&mut self, entry: &Entry) {
        match entry.category {
            Category::Income => self.income += entry.amount,
            Category::Expense => self.expenses += entry.amount,
            Category::Bill => self.bills += entry.amount,
            Category::Savings => self.savings += entry.amount,
        }
        self.net += entry.signed_amount();
        self.left += entry.signed_amount();
    }

    fn adjust(&mut self, adjustment: &MonthAdjustment) {
        self.rollover = adjustment.rollover;
        self.debt = adjustment.debt;
        self.left += adjustment.signed();
    }

    /// income + expenses + bills + savings, unsigned.
    pub fn gross(&self) -> Decimal {
        self.income + self.expenses + self.bills + self.savings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSummary {
    pub year: i32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub bills: Decimal,
    pub savings: Decimal,
    pub net: Decimal,
    pub debt: Decimal,
    /// `net - debt`. Rollovers carry between months and are left out.
    pub left: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillStatus {
    pub count: usize,
    pub paid: usize,
    pub total: Decimal,
    pub unpaid_total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: Decimal,
}

fn in_month(entry: &Entry, year: i32, month: u32) -> bool {
    entry.date.year() == year && entry.date.month() == month
}

pub fn monthly_summary(ledger: &Ledger, year: i32, month: u32) -> MonthlySummary {
    let mut summary = MonthlySummary::zero(year, month);
    for entry in ledger.all().filter(|e| in_month(e, year, month)) {
        summary.accumulate(entry);
    }
    if let Some(adjustment) = ledger.adjustment(year, month) {
        summary.adjust(adjustment);
    }
    summary
}

/// Twelve summaries, January first. Single pass over the ledger.
pub fn yearly_comparison(ledger: &Ledger, year: i32) -> Vec<MonthlySummary> {
    let mut months: Vec<MonthlySummary> = (1..=12).map(|m| MonthlySummary::zero(year, m)).collect();
    for entry in ledger.all().filter(|e| e.date.year() == year) {
        months[entry.date.month0() as usize].accumulate(entry);
    }
    for adjustment in ledger.adjustments().iter().filter(|a| a.year == year) {
        let slot = adjustment
            .month
            .checked_sub(1)
            .and_then(|i| months.get_mut(i as usize));
        if let Some(summary) = slot {
            summary.adjust(adjustment);
        }
    }
    months
}

pub fn year_summary(ledger: &Ledger, year: i32) -> YearSummary {
    let mut total = yearly_comparison(ledger, year).iter().fold(
        YearSummary {
            year,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            bills: Decimal::ZERO,
            savings: Decimal::ZERO,
            net: Decimal::ZERO,
            debt: Decimal::ZERO,
            left: Decimal::ZERO,
        },
        |mut acc, m| {
            acc.income += m.income;
            acc.expenses += m.expenses;
            acc.bills += m.bills;
            acc.savings += m.savings;
            acc.net += m.net;
            acc.debt += m.debt;
            acc
        },
    );
    total.left = total.net - total.debt;
    total
}

/// Total per category for the month. All four categories are present.
pub fn category_breakdown(ledger: &Ledger, year: i32, month: u32) -> BTreeMap<Category, Decimal> {
    let mut totals: BTreeMap<Category, Decimal> =
        Category::ALL.iter().map(|c| (*c, Decimal::ZERO)).collect();
    for entry in ledger.all().filter(|e| in_month(e, year, month)) {
        *totals.entry(entry.category).or_insert(Decimal::ZERO) += entry.amount;
    }
    totals
}

pub fn bill_status(ledger: &Ledger, year: i32, month: u32) -> BillStatus {
    ledger
        .all()
        .filter(|e| e.category == Category::Bill && in_month(e, year, month))
        .fold(
            BillStatus {
                count: 0,
                paid: 0,
                total: Decimal::ZERO,
                unpaid_total: Decimal::ZERO,
            },
            |mut acc, e| {
                acc.count += 1;
                acc.total += e.amount;
                if e.paid {
                    acc.paid += 1;
                } else {
                    acc.unpaid_total += e.amount;
                }
                acc
            },
        )
}

/// Cumulative signed balance over `[from, to]`, one point per distinct date.
pub fn running_balance<'a>(ledger: &'a Ledger, from: NaiveDate, to: NaiveDate) -> RunningBalance<'a> {
    let mut entries: Vec<&'a Entry> = ledger
        .all()
        .filter(|e| e.date >= from && e.date <= to)
        .collect();
    entries.sort_by_key(|e| (e.date, e.id));
    RunningBalance {
        entries,
        position: 0,
        balance: Decimal::ZERO,
    }
}

/// Lazy iterator behind [`running_balance`]. Cloning it restarts from the
/// clone's current position.
#[derive(Debug, Clone)]
pub struct RunningBalance<'a> {
    entries: Vec<&'a Entry>,
    position: usize,
    balance: Decimal,
}

impl Iterator for RunningBalance<'_> {
    type Item = BalancePoint;

    fn next(&mut self) -> Option<BalancePoint> {
        let date = self.entries.get(self.position)?.date;
        while let Some(entry) = self.entries.get(self.position) {
            if entry.date != date {
                break;
            }
            self.balance += entry.signed_amount();
            self.position += 1;
        }
        Some(BalancePoint {
            date,
            balance: self.balance,
        })
    }
}
