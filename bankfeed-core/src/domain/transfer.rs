//! Transfer records and import outcome types

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, CurrencyId, TransferId};
use super::mapping::DiscoveredAccountMapping;
use super::result::RowError;

/// Row outcome of an import run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ImportStatus {
    /// New transfer, nothing like it stored yet
    Imported,
    /// Exact match of a stored transfer
    Duplicate,
    /// Matches a stored transfer but some fields changed
    Updated,
    /// The row could not be mapped
    Error,
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Imported => "imported",
            Self::Duplicate => "duplicate",
            Self::Updated => "updated",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A validated financial transfer produced from one CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub source_account_id: AccountId,
    pub target_account_id: AccountId,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Amount in minor units of `currency_id`, sign as parsed
    pub amount: i64,
    pub currency_id: CurrencyId,
}

/// A previously imported transfer, flattened for duplicate comparison
///
/// The caller decides which stored transfers are candidates (typically
/// those touching the same accounts) and supplies them in storage order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingTransferInfo {
    pub id: TransferId,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Minor units, same convention as [`Transfer::amount`]
    pub amount: i64,
    /// Attribute type name to stored value
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Unique-identifier column name to the value captured at import time
    #[serde(default)]
    pub unique_values: BTreeMap<String, String>,
}

/// Outcome of mapping one CSV row into a transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedTransfer {
    /// Zero-based index of the source row
    pub row_index: usize,
    pub transfer: Transfer,
    /// Attribute type name to value read from the row; blank values skipped
    pub attributes: BTreeMap<String, String>,
    /// Unique-identifier column to value as read, blanks kept
    pub unique_values: BTreeMap<String, String>,
    /// Name of the account to create when a side resolved to a new account
    ///
    /// One slot per row: when both sides discover a name, the target side,
    /// resolved second, occupies it and the source side stays on the
    /// placeholder id.
    pub new_account_name: Option<String>,
    pub discovered_mapping: Option<DiscoveredAccountMapping>,
    /// Filled in by duplicate detection during batch preparation
    pub status: Option<ImportStatus>,
    pub existing_transfer_id: Option<TransferId>,
}

/// Per-row result: a transfer or an isolated failure
#[derive(Debug, Clone, PartialEq)]
pub enum MappingResult {
    Mapped(MappedTransfer),
    Failed(RowError),
}

/// Everything a caller needs to review and persist an import batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreparation {
    /// Successfully mapped transfers in input order, statuses stamped
    pub valid_transfers: Vec<MappedTransfer>,
    /// Rows that failed to map, in input order
    pub error_rows: Vec<RowError>,
    /// Account names to create, deduplicated, first seen first
    pub new_accounts: Vec<String>,
    /// Row tally per status; failed rows count under [`ImportStatus::Error`]
    pub status_counts: BTreeMap<ImportStatus, usize>,
}

impl ImportPreparation {
    /// Total number of rows that went through the mapper
    pub fn total_rows(&self) -> usize {
        self.valid_transfers.len() + self.error_rows.len()
    }

    pub fn count(&self, status: ImportStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }
}
