//! Domain error types.

use crate::domain::entry::EntryId;

/// Top-level error type for ledgerbook.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no entry with id {id}")]
    NotFound { id: EntryId },

    #[error("corrupt snapshot at {location}: {reason}")]
    CorruptData { location: String, reason: String },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("export error: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&LedgerError> for std::process::ExitCode {
    fn from(err: &LedgerError) -> Self {
        let code: u8 = match err {
            LedgerError::Io(_) | LedgerError::Storage { .. } | LedgerError::Export { .. } => 1,
            LedgerError::ConfigParse { .. } | LedgerError::ConfigInvalid { .. } => 2,
            LedgerError::Validation { .. } => 3,
            LedgerError::NotFound { .. } => 4,
            LedgerError::CorruptData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
