//! Services orchestrating the import pipeline over the domain types

pub mod accounts;
pub mod amounts;
pub mod duplicates;
pub mod fields;
pub mod mapper;
pub mod strategies;

pub use accounts::{AccountResolution, AccountResolver, TransferSide};
pub use amounts::{parse_decimal, parse_minor_units};
pub use duplicates::DuplicateDetector;
pub use fields::{FieldResolver, FieldValue, RowContext};
pub use mapper::TransferMapper;
pub use strategies::{
    find_all_matching_strategies, find_matching_strategy, suggest_columns, SuggestedColumns,
};
