//! Import strategies: user-authored descriptions of a bank's CSV layout
//!
//! A strategy says which header set it claims and how each transfer field
//! is computed from a row. Mapping kinds form one closed enum, so field
//! evaluation is an exhaustive `match` and a new kind is a compile error
//! until every consumer handles it.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, CurrencyId, StrategyId, TimezoneId};
use super::result::{Error, Result};

/// The transfer fields a strategy can populate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TransferField {
    SourceAccount,
    TargetAccount,
    Timestamp,
    Description,
    Amount,
    Currency,
    Timezone,
}

impl TransferField {
    /// The fields every usable strategy must map; `Timezone` is optional
    pub const REQUIRED: [TransferField; 6] = [
        TransferField::SourceAccount,
        TransferField::TargetAccount,
        TransferField::Timestamp,
        TransferField::Description,
        TransferField::Amount,
        TransferField::Currency,
    ];
}

impl fmt::Display for TransferField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SourceAccount => "source account",
            Self::TargetAccount => "target account",
            Self::Timestamp => "timestamp",
            Self::Description => "description",
            Self::Amount => "amount",
            Self::Currency => "currency",
            Self::Timezone => "timezone",
        };
        f.write_str(name)
    }
}

/// One ordered rule of a regex account mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexRule {
    /// Pattern tested case-insensitively against the column value
    pub pattern: String,
    /// Account name the rule resolves to
    pub account_name: String,
}

impl RegexRule {
    pub fn new(pattern: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            account_name: account_name.into(),
        }
    }
}

/// Where an amount mapping reads its numbers from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AmountColumns {
    /// One signed column
    Single { column: String },
    /// Paired columns: money out in `debit`, money in in `credit`
    DebitCredit { debit: String, credit: String },
}

/// How one transfer field is computed from a CSV row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FieldMapping {
    /// Always the same account, no column read
    HardCodedAccount { account_id: AccountId },
    /// Account by exact name from a column, with optional fallback columns
    AccountLookup {
        column: String,
        #[serde(default)]
        fallback_columns: Vec<String>,
        /// When false, unknown names degrade to the placeholder instead of
        /// proposing a new account
        #[serde(default = "default_true")]
        create_if_missing: bool,
    },
    /// Account via ordered regex rules, falling back to lookup by value
    RegexAccount {
        column: String,
        rules: Vec<RegexRule>,
        #[serde(default)]
        fallback_columns: Vec<String>,
    },
    /// Raw cell text
    DirectColumn { column: String },
    /// Date or datetime parsed with a chrono format string
    DateTime {
        date_column: String,
        format: String,
        /// Separate time column, appended space-separated when present
        #[serde(default)]
        time_column: Option<String>,
    },
    /// Monetary amount in the row's currency
    Amount {
        columns: AmountColumns,
        /// Negate every parsed value (for banks that export spends positive)
        #[serde(default)]
        negate_values: bool,
        /// Swap source and target when the final amount is positive
        #[serde(default)]
        flip_accounts_on_positive: bool,
    },
    /// Always the same currency
    HardCodedCurrency { currency_id: CurrencyId },
    /// Currency by ISO code from a column
    CurrencyLookup { column: String },
    /// Always the same timezone
    HardCodedTimezone { timezone_id: TimezoneId },
    /// Timezone by zone name from a column
    TimezoneLookup { column: String },
}

fn default_true() -> bool {
    true
}

impl FieldMapping {
    /// Whether this mapping kind may populate the given transfer field
    pub fn fits_field(&self, field: TransferField) -> bool {
        use TransferField::*;
        match self {
            Self::HardCodedAccount { .. }
            | Self::AccountLookup { .. }
            | Self::RegexAccount { .. } => matches!(field, SourceAccount | TargetAccount),
            Self::DirectColumn { .. } => matches!(field, Description),
            Self::DateTime { .. } => matches!(field, Timestamp),
            Self::Amount { .. } => matches!(field, Amount),
            Self::HardCodedCurrency { .. } | Self::CurrencyLookup { .. } => {
                matches!(field, Currency)
            }
            Self::HardCodedTimezone { .. } | Self::TimezoneLookup { .. } => {
                matches!(field, Timezone)
            }
        }
    }
}

/// Extra column captured as a transfer attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeColumnMapping {
    /// CSV column to read
    pub column: String,
    /// Attribute type name the value is stored under
    pub attribute: String,
    /// Participates in duplicate detection
    #[serde(default)]
    pub unique_identifier: bool,
}

impl AttributeColumnMapping {
    pub fn new(column: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            attribute: attribute.into(),
            unique_identifier: false,
        }
    }

    pub fn unique(column: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            unique_identifier: true,
            ..Self::new(column, attribute)
        }
    }
}

/// A user-authored description of one bank's CSV layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStrategy {
    pub id: StrategyId,
    pub name: String,
    /// Header names that identify this layout, compared as a set
    pub identification_columns: Vec<String>,
    /// At most one mapping per transfer field
    pub field_mappings: BTreeMap<TransferField, FieldMapping>,
    #[serde(default)]
    pub attribute_mappings: Vec<AttributeColumnMapping>,
}

impl ImportStrategy {
    /// Empty strategy; callers fill in the mappings before use
    pub fn new(id: StrategyId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            identification_columns: Vec::new(),
            field_mappings: BTreeMap::new(),
            attribute_mappings: Vec::new(),
        }
    }

    /// Whether this strategy claims the given header set
    ///
    /// Exact set equality: order does not matter, extra or missing headers
    /// disqualify.
    pub fn matches_headers(&self, headers: &[String]) -> bool {
        let want: HashSet<&str> = self
            .identification_columns
            .iter()
            .map(String::as_str)
            .collect();
        let have: HashSet<&str> = headers.iter().map(String::as_str).collect();
        want == have
    }

    pub fn mapping(&self, field: TransferField) -> Option<&FieldMapping> {
        self.field_mappings.get(&field)
    }

    /// Attribute mappings flagged as unique identifiers, in declaration order
    pub fn unique_identifier_columns(&self) -> Vec<&str> {
        self.attribute_mappings
            .iter()
            .filter(|m| m.unique_identifier)
            .map(|m| m.column.as_str())
            .collect()
    }

    /// Check the strategy is complete and internally consistent
    ///
    /// A strategy passes when every required field has a mapping, every
    /// mapping kind is legal for its slot, every regex rule compiles and no
    /// attribute type is captured twice.
    pub fn validate(&self) -> Result<()> {
        for field in TransferField::REQUIRED {
            if !self.field_mappings.contains_key(&field) {
                return Err(Error::strategy(format!(
                    "strategy '{}' has no mapping for the {} field",
                    self.name, field
                )));
            }
        }

        for (field, mapping) in &self.field_mappings {
            if !mapping.fits_field(*field) {
                return Err(Error::strategy(format!(
                    "strategy '{}' maps the {} field with an incompatible mapping kind",
                    self.name, field
                )));
            }
            if let FieldMapping::RegexAccount { rules, .. } = mapping {
                for rule in rules {
                    if let Err(e) = RegexBuilder::new(&rule.pattern)
                        .case_insensitive(true)
                        .build()
                    {
                        return Err(Error::strategy(format!(
                            "strategy '{}' has an invalid pattern '{}': {}",
                            self.name, rule.pattern, e
                        )));
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for attribute in &self.attribute_mappings {
            if !seen.insert(attribute.attribute.as_str()) {
                return Err(Error::strategy(format!(
                    "strategy '{}' captures attribute '{}' twice",
                    self.name, attribute.attribute
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_strategy() -> ImportStrategy {
        let mut strategy = ImportStrategy::new(StrategyId(1), "Test Bank");
        strategy.field_mappings = BTreeMap::from([
            (
                TransferField::SourceAccount,
                FieldMapping::HardCodedAccount {
                    account_id: AccountId(1),
                },
            ),
            (
                TransferField::TargetAccount,
                FieldMapping::AccountLookup {
                    column: "Payee".into(),
                    fallback_columns: vec![],
                    create_if_missing: true,
                },
            ),
            (
                TransferField::Timestamp,
                FieldMapping::DateTime {
                    date_column: "Date".into(),
                    format: "%d/%m/%Y".into(),
                    time_column: None,
                },
            ),
            (
                TransferField::Description,
                FieldMapping::DirectColumn {
                    column: "Details".into(),
                },
            ),
            (
                TransferField::Amount,
                FieldMapping::Amount {
                    columns: AmountColumns::Single {
                        column: "Amount".into(),
                    },
                    negate_values: false,
                    flip_accounts_on_positive: false,
                },
            ),
            (
                TransferField::Currency,
                FieldMapping::HardCodedCurrency {
                    currency_id: CurrencyId(1),
                },
            ),
        ]);
        strategy
    }

    #[test]
    fn test_header_matching_is_set_equality() {
        let mut strategy = ImportStrategy::new(StrategyId(1), "Test");
        strategy.identification_columns = vec!["Date".into(), "Amount".into(), "Payee".into()];

        let shuffled = vec!["Payee".to_string(), "Date".to_string(), "Amount".to_string()];
        assert!(strategy.matches_headers(&shuffled));

        let missing = vec!["Date".to_string(), "Amount".to_string()];
        assert!(!strategy.matches_headers(&missing));

        let extra = vec![
            "Date".to_string(),
            "Amount".to_string(),
            "Payee".to_string(),
            "Balance".to_string(),
        ];
        assert!(!strategy.matches_headers(&extra));
    }

    #[test]
    fn test_validate_accepts_complete_strategy() {
        assert!(complete_strategy().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_all_core_fields() {
        let mut strategy = complete_strategy();
        strategy.field_mappings.remove(&TransferField::Amount);

        let err = strategy.validate().unwrap_err();
        assert!(err.to_string().contains("no mapping for the amount field"));
    }

    #[test]
    fn test_validate_rejects_misplaced_mapping_kind() {
        let mut strategy = complete_strategy();
        strategy.field_mappings.insert(
            TransferField::Description,
            FieldMapping::HardCodedCurrency {
                currency_id: CurrencyId(1),
            },
        );

        let err = strategy.validate().unwrap_err();
        assert!(err.to_string().contains("incompatible mapping kind"));
    }

    #[test]
    fn test_validate_rejects_broken_rule_pattern() {
        let mut strategy = complete_strategy();
        strategy.field_mappings.insert(
            TransferField::TargetAccount,
            FieldMapping::RegexAccount {
                column: "Payee".into(),
                rules: vec![RegexRule::new("[unclosed", "Groceries")],
                fallback_columns: vec![],
            },
        );

        let err = strategy.validate().unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_validate_rejects_duplicate_attribute() {
        let mut strategy = complete_strategy();
        strategy.attribute_mappings = vec![
            AttributeColumnMapping::new("Reference", "reference"),
            AttributeColumnMapping::unique("Transaction ID", "reference"),
        ];

        let err = strategy.validate().unwrap_err();
        assert!(err.to_string().contains("captures attribute 'reference' twice"));
    }

    #[test]
    fn test_field_mapping_json_shape() {
        let mapping = FieldMapping::Amount {
            columns: AmountColumns::DebitCredit {
                debit: "Paid Out".into(),
                credit: "Paid In".into(),
            },
            negate_values: false,
            flip_accounts_on_positive: true,
        };

        let json = serde_json::to_value(&mapping).unwrap();
        assert_eq!(json["kind"], "amount");
        assert_eq!(json["columns"]["mode"], "debitCredit");
        assert_eq!(json["columns"]["debit"], "Paid Out");
        assert_eq!(json["flipAccountsOnPositive"], true);

        let back: FieldMapping = serde_json::from_value(json).unwrap();
        assert_eq!(back, mapping);
    }
}
