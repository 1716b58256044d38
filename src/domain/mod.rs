//! Core domain types and logic.

pub mod adjustment;
pub mod aggregation;
pub mod entry;
pub mod error;
pub mod ledger;
pub mod session;
pub mod settings;
