//! Duplicate classification against previously imported transfers
//!
//! Two regimes, chosen by the strategy. With unique-identifier columns the
//! stored identifier values are authoritative: a transfer with the same
//! identifiers is the same transfer, however much the rest of it changed.
//! Without them the whole record is the identity, and only field equality
//! can tell a duplicate from a new transfer.

use crate::domain::{ExistingTransferInfo, ImportStatus, MappedTransfer, TransferId};

/// Classifies mapped transfers against the stored ones
pub struct DuplicateDetector<'a> {
    existing: &'a [ExistingTransferInfo],
    unique_columns: Vec<String>,
}

impl<'a> DuplicateDetector<'a> {
    /// `unique_columns` come from the strategy's attribute mappings; an
    /// empty list switches to whole-record comparison.
    pub fn new(existing: &'a [ExistingTransferInfo], unique_columns: Vec<String>) -> Self {
        Self {
            existing,
            unique_columns,
        }
    }

    /// Classify a mapped transfer, returning the matched stored transfer
    /// when there is one
    pub fn classify(&self, candidate: &MappedTransfer) -> (ImportStatus, Option<TransferId>) {
        if self.unique_columns.is_empty() {
            self.classify_by_record(candidate)
        } else {
            self.classify_by_unique_ids(candidate)
        }
    }

    fn classify_by_unique_ids(
        &self,
        candidate: &MappedTransfer,
    ) -> (ImportStatus, Option<TransferId>) {
        // a row with no identifier values at all is always new
        let all_blank = self.unique_columns.iter().all(|column| {
            candidate
                .unique_values
                .get(column)
                .map(|value| value.trim().is_empty())
                .unwrap_or(true)
        });
        if all_blank {
            return (ImportStatus::Imported, None);
        }

        for existing in self.existing {
            let identifiers_match = self.unique_columns.iter().all(|column| {
                match (
                    candidate.unique_values.get(column),
                    existing.unique_values.get(column),
                ) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            });
            if !identifiers_match {
                continue;
            }
            return if same_record(candidate, existing) {
                (ImportStatus::Duplicate, Some(existing.id))
            } else {
                (ImportStatus::Updated, Some(existing.id))
            };
        }

        (ImportStatus::Imported, None)
    }

    fn classify_by_record(
        &self,
        candidate: &MappedTransfer,
    ) -> (ImportStatus, Option<TransferId>) {
        // exact matches first, so a row is never reported as an update of
        // one transfer while being identical to another
        if let Some(transfer) = self.existing.iter().find(|t| same_record(candidate, t)) {
            return (ImportStatus::Duplicate, Some(transfer.id));
        }
        if let Some(transfer) = self.existing.iter().find(|t| same_core(candidate, t)) {
            return (ImportStatus::Updated, Some(transfer.id));
        }
        (ImportStatus::Imported, None)
    }
}

/// Timestamp, description and amount all equal
fn same_core(candidate: &MappedTransfer, existing: &ExistingTransferInfo) -> bool {
    candidate.transfer.timestamp == existing.timestamp
        && candidate.transfer.description == existing.description
        && candidate.transfer.amount == existing.amount
}

/// Core fields plus the full attribute set equal
fn same_record(candidate: &MappedTransfer, existing: &ExistingTransferInfo) -> bool {
    same_core(candidate, existing) && candidate.attributes == existing.attributes
}
