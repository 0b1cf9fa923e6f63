//! Result and error types for the import engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Import engine error type
///
/// The column, date, amount, and currency kinds are row-scoped: the mapper
/// turns them into a [`RowError`] and keeps going. `Strategy` is raised at
/// mapper construction and fails the whole run before any row is touched.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Date parse error: {0}")]
    DateParse(String),

    #[error("Amount parse error: {0}")]
    AmountParse(String),

    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    #[error("Strategy error: {0}")]
    Strategy(String),
}

impl Error {
    /// Create a column not found error
    pub fn column_not_found(msg: impl Into<String>) -> Self {
        Self::ColumnNotFound(msg.into())
    }

    /// Create a date parse error
    pub fn date_parse(msg: impl Into<String>) -> Self {
        Self::DateParse(msg.into())
    }

    /// Create an amount parse error
    pub fn amount_parse(msg: impl Into<String>) -> Self {
        Self::AmountParse(msg.into())
    }

    /// Create a currency not found error
    pub fn currency_not_found(msg: impl Into<String>) -> Self {
        Self::CurrencyNotFound(msg.into())
    }

    /// Create a strategy error
    pub fn strategy(msg: impl Into<String>) -> Self {
        Self::Strategy(msg.into())
    }
}

/// Import engine result type
pub type Result<T> = std::result::Result<T, Error>;

/// A row that failed to map, with its position in the source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// Zero-based index of the row in the parsed file
    pub row_index: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row_index: usize, error: &Error) -> Self {
        Self {
            row_index,
            message: error.to_string(),
        }
    }
}
