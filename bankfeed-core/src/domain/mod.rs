//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external
//! dependencies. Everything the services operate on is defined here.

mod account;
mod csv;
mod currency;
mod ids;
mod mapping;
mod snapshot;
mod strategy;
mod timezone;
mod transfer;

pub mod result;

pub use account::Account;
pub use csv::{ColumnIndex, CsvColumn, CsvRow};
pub use currency::Currency;
pub use ids::{AccountId, CurrencyId, MappingId, StrategyId, TimezoneId, TransferId};
pub use mapping::{CsvAccountMapping, DiscoveredAccountMapping};
pub use snapshot::ImportSnapshot;
pub use strategy::{
    AmountColumns, AttributeColumnMapping, FieldMapping, ImportStrategy, RegexRule, TransferField,
};
pub use timezone::Timezone;
pub use transfer::{
    ExistingTransferInfo, ImportPreparation, ImportStatus, MappedTransfer, MappingResult, Transfer,
};
