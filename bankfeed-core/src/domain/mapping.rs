//! Persisted and discovered account mappings
//!
//! Mappings are how the engine learns. A confirmed import leaves behind
//! `CsvAccountMapping` rows; the next run consults them before any rule or
//! name lookup, so the same counterparty lands on the same account without
//! the user re-answering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, MappingId, StrategyId};

/// A persisted column-value to account mapping
///
/// Lower ids were created earlier and win when several mappings match the
/// same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvAccountMapping {
    pub id: MappingId,
    /// Strategy the mapping was learned under
    pub strategy_id: StrategyId,
    /// Column the mapping listens on
    pub column: String,
    /// Pattern tested case-insensitively against the cell value
    pub pattern: String,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CsvAccountMapping {
    pub fn new(
        id: MappingId,
        strategy_id: StrategyId,
        column: impl Into<String>,
        pattern: impl Into<String>,
        account_id: AccountId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            strategy_id,
            column: column.into(),
            pattern: pattern.into(),
            account_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A mapping discovered during this run, offered to the caller to persist
///
/// `pattern` is `None` when the account came from plain value lookup; a
/// confirming caller derives an anchored exact-match pattern from
/// `csv_value`. A `Some` pattern reuses the regex rule that produced the
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredAccountMapping {
    /// Column whose value resolved the account
    pub column: String,
    /// The raw value that was seen
    pub csv_value: String,
    /// Account the value resolved to
    pub account_name: String,
    pub pattern: Option<String>,
}
