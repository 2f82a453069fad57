use std::result::Result as StdResult;

use thiserror::Error;

/// Unified error type for the calendar, store, parser and ingestion layers.
#[derive(Debug, Error)]
pub enum PaymentsError {
    #[error("Persistence error: {0}")]
    StorageError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid date: day {day} does not exist in {month:02}/{year}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("{0} support is not available in this build")]
    Unavailable(String),
    #[error("Source `{source_name}` failed: {reason}")]
    SourceFailed { source_name: String, reason: String },
}

pub type Result<T> = StdResult<T, PaymentsError>;

impl PaymentsError {
    /// True for errors that only affect a single line, row or source.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PaymentsError::InvalidDate { .. }
                | PaymentsError::InvalidInput(_)
                | PaymentsError::SourceFailed { .. }
        )
    }
}

impl From<std::io::Error> for PaymentsError {
    fn from(err: std::io::Error) -> Self {
        PaymentsError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for PaymentsError {
    fn from(err: serde_json::Error) -> Self {
        PaymentsError::StorageError(err.to_string())
    }
}

impl From<csv::Error> for PaymentsError {
    fn from(err: csv::Error) -> Self {
        PaymentsError::StorageError(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PaymentsError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        PaymentsError::StorageError("payment store lock poisoned".into())
    }
}
