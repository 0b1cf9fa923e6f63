//! Bankfeed Core - CSV import transformation and duplicate detection
//!
//! Turns bank CSV exports into double-entry transfers:
//!
//! - **domain**: Core entities (ImportStrategy, Transfer, ImportSnapshot, etc.)
//! - **services**: The import pipeline (strategy matching, field resolution,
//!   account resolution, duplicate detection)
//! - **config**: Strategy catalog persistence
//!
//! Everything except [`config`] is pure: callers hand in parsed CSV cells
//! and a snapshot of their reference data, and get mapped transfers back.
//! The crate performs no I/O of its own and never touches a database.

pub mod config;
pub mod domain;
pub mod services;

// Re-export commonly used types at crate root
pub use config::StrategyCatalog;
pub use domain::result::{Error, Result, RowError};
pub use domain::{
    Account, AccountId, AmountColumns, AttributeColumnMapping, ColumnIndex, CsvAccountMapping,
    CsvColumn, CsvRow, Currency, CurrencyId, DiscoveredAccountMapping, ExistingTransferInfo,
    FieldMapping, ImportPreparation, ImportSnapshot, ImportStatus, ImportStrategy, MappedTransfer,
    MappingId, MappingResult, RegexRule, StrategyId, Timezone, TimezoneId, Transfer,
    TransferField, TransferId,
};
pub use services::{
    find_all_matching_strategies, find_matching_strategy, suggest_columns, AccountResolution,
    AccountResolver, DuplicateDetector, FieldResolver, FieldValue, RowContext, SuggestedColumns,
    TransferMapper, TransferSide,
};
