//! Row-to-transfer orchestration
//!
//! The mapper owns everything a batch needs: the validated strategy, the
//! header index, the reference snapshot and the compiled account resolver.
//! Mapping runs in dependency order, currency and timezone before the
//! fields that need their scale and offset. One bad row stays one bad row;
//! `prepare_import` records the failure and keeps going.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::result::{Error, Result, RowError};
use crate::domain::{
    AccountId, ColumnIndex, CsvColumn, CsvRow, DiscoveredAccountMapping, FieldMapping,
    ImportPreparation, ImportSnapshot, ImportStatus, ImportStrategy, MappedTransfer,
    MappingResult, Transfer, TransferField,
};
use crate::services::accounts::{AccountResolution, AccountResolver};
use crate::services::duplicates::DuplicateDetector;
use crate::services::fields::{FieldResolver, RowContext};

/// Maps CSV rows to transfers under one strategy
pub struct TransferMapper {
    strategy: ImportStrategy,
    columns: ColumnIndex,
    snapshot: ImportSnapshot,
    accounts: AccountResolver,
    flip_on_positive: bool,
}

impl TransferMapper {
    /// Validate the strategy and compile it against the file's headers
    pub fn new(
        strategy: ImportStrategy,
        columns: &[CsvColumn],
        snapshot: ImportSnapshot,
    ) -> Result<Self> {
        strategy.validate()?;
        let accounts = AccountResolver::new(&strategy, &snapshot)?;
        let flip_on_positive = matches!(
            strategy.mapping(TransferField::Amount),
            Some(FieldMapping::Amount {
                flip_accounts_on_positive: true,
                ..
            })
        );
        Ok(Self {
            strategy,
            columns: ColumnIndex::new(columns),
            snapshot,
            accounts,
            flip_on_positive,
        })
    }

    pub fn strategy(&self) -> &ImportStrategy {
        &self.strategy
    }

    /// Map one row, converting any failure into a row-scoped error
    pub fn map_row(&self, row: &CsvRow) -> MappingResult {
        match self.map_row_inner(row) {
            Ok(mapped) => MappingResult::Mapped(mapped),
            Err(e) => MappingResult::Failed(RowError::new(row.row_index, &e)),
        }
    }

    fn map_row_inner(&self, row: &CsvRow) -> Result<MappedTransfer> {
        let resolver = FieldResolver {
            columns: &self.columns,
            snapshot: &self.snapshot,
            accounts: &self.accounts,
        };

        // currency and timezone first; amount and timestamp parsing depend
        // on what they yield
        let initial = RowContext::initial();
        let currency_id = resolver
            .resolve(
                TransferField::Currency,
                self.required(TransferField::Currency)?,
                row,
                &initial,
            )?
            .into_currency()?;
        let minor_unit = self
            .snapshot
            .currency(currency_id)
            .map(|c| c.minor_unit)
            .ok_or_else(|| Error::currency_not_found(format!("id {currency_id}")))?;

        let utc_offset_minutes = match self.strategy.mapping(TransferField::Timezone) {
            Some(mapping) => resolver
                .resolve(TransferField::Timezone, mapping, row, &initial)?
                .into_utc_offset()?,
            None => 0,
        };

        let cx = RowContext {
            minor_unit,
            utc_offset_minutes,
        };

        let timestamp = resolver
            .resolve(
                TransferField::Timestamp,
                self.required(TransferField::Timestamp)?,
                row,
                &cx,
            )?
            .into_timestamp()?;
        let description = resolver
            .resolve(
                TransferField::Description,
                self.required(TransferField::Description)?,
                row,
                &cx,
            )?
            .into_text()?;
        let amount = resolver
            .resolve(
                TransferField::Amount,
                self.required(TransferField::Amount)?,
                row,
                &cx,
            )?
            .into_amount()?;

        let source = resolver
            .resolve(
                TransferField::SourceAccount,
                self.required(TransferField::SourceAccount)?,
                row,
                &cx,
            )?
            .into_account()?;
        let target = resolver
            .resolve(
                TransferField::TargetAccount,
                self.required(TransferField::TargetAccount)?,
                row,
                &cx,
            )?
            .into_account()?;

        let mut new_account_name = None;
        let mut discovered_mapping = None;
        let mut source_account_id =
            account_id_for(source, &mut new_account_name, &mut discovered_mapping);
        let mut target_account_id =
            account_id_for(target, &mut new_account_name, &mut discovered_mapping);

        if self.flip_on_positive && amount > 0 {
            std::mem::swap(&mut source_account_id, &mut target_account_id);
        }

        let mut attributes = BTreeMap::new();
        let mut unique_values = BTreeMap::new();
        for mapping in &self.strategy.attribute_mappings {
            let value = self.columns.cell(row, &mapping.column)?.trim();
            // identifier values are kept even when blank; the detector needs
            // to see that the row carried nothing
            if mapping.unique_identifier {
                unique_values.insert(mapping.column.clone(), value.to_string());
            }
            if !value.is_empty() {
                attributes.insert(mapping.attribute.clone(), value.to_string());
            }
        }

        Ok(MappedTransfer {
            row_index: row.row_index,
            transfer: Transfer {
                source_account_id,
                target_account_id,
                timestamp,
                description,
                amount,
                currency_id,
            },
            attributes,
            unique_values,
            new_account_name,
            discovered_mapping,
            status: None,
            existing_transfer_id: None,
        })
    }

    fn required(&self, field: TransferField) -> Result<&FieldMapping> {
        self.strategy
            .mapping(field)
            .ok_or_else(|| Error::strategy(format!("no mapping for the {field} field")))
    }

    /// Map a batch and classify every mapped row against stored transfers
    pub fn prepare_import(&self, rows: &[CsvRow]) -> ImportPreparation {
        let unique_columns: Vec<String> = self
            .strategy
            .unique_identifier_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        let detector = DuplicateDetector::new(self.snapshot.existing_transfers(), unique_columns);

        let mut preparation = ImportPreparation::default();
        for row in rows {
            match self.map_row(row) {
                MappingResult::Mapped(mut mapped) => {
                    let (status, existing_id) = detector.classify(&mapped);
                    mapped.status = Some(status);
                    mapped.existing_transfer_id = existing_id;
                    *preparation.status_counts.entry(status).or_insert(0) += 1;
                    if let Some(name) = &mapped.new_account_name {
                        if !preparation.new_accounts.contains(name) {
                            preparation.new_accounts.push(name.clone());
                        }
                    }
                    preparation.valid_transfers.push(mapped);
                }
                MappingResult::Failed(error) => {
                    *preparation
                        .status_counts
                        .entry(ImportStatus::Error)
                        .or_insert(0) += 1;
                    preparation.error_rows.push(error);
                }
            }
        }

        debug!(
            strategy = %self.strategy.name,
            total = preparation.total_rows(),
            imported = preparation.count(ImportStatus::Imported),
            duplicates = preparation.count(ImportStatus::Duplicate),
            updated = preparation.count(ImportStatus::Updated),
            errors = preparation.error_rows.len(),
            new_accounts = preparation.new_accounts.len(),
            "prepared import batch"
        );
        preparation
    }
}

/// Turn a side's resolution into an id, claiming the row's new-account slot
/// when the side discovered one; the later caller overwrites the earlier
fn account_id_for(
    resolution: AccountResolution,
    new_account_name: &mut Option<String>,
    discovered_mapping: &mut Option<DiscoveredAccountMapping>,
) -> AccountId {
    match resolution {
        AccountResolution::Existing(id) => id,
        AccountResolution::New { name, discovered } => {
            *new_account_name = Some(name);
            *discovered_mapping = Some(discovered);
            AccountId::PLACEHOLDER
        }
        AccountResolution::Placeholder => AccountId::PLACEHOLDER,
    }
}
