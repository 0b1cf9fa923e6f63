//! Account resolution for transfer sides
//!
//! Resolution runs in a strict order: persisted mappings learned from
//! earlier imports, then the strategy's own regex rules, then plain name
//! lookup. A row that yields nothing usable degrades to the placeholder
//! account instead of failing, so one unknown counterparty never blocks a
//! batch.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AccountId, ColumnIndex, CsvRow, DiscoveredAccountMapping, FieldMapping, ImportSnapshot,
    ImportStrategy, RegexRule, TransferField,
};

/// Which side of the transfer is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSide {
    Source,
    Target,
}

/// Outcome of resolving one transfer side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountResolution {
    /// Matched an account the application already has
    Existing(AccountId),
    /// Names an account to create, with the mapping that found it
    New {
        name: String,
        discovered: DiscoveredAccountMapping,
    },
    /// Nothing usable in the row; the side gets the placeholder id
    Placeholder,
}

struct CompiledAccountMapping {
    column: String,
    regex: Regex,
    account_id: AccountId,
}

struct CompiledRule {
    pattern: String,
    regex: Regex,
    account_name: String,
}

impl CompiledRule {
    fn compile(rule: &RegexRule) -> Result<Self> {
        let regex = RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::strategy(format!("invalid pattern '{}': {}", rule.pattern, e)))?;
        Ok(Self {
            pattern: rule.pattern.clone(),
            regex,
            account_name: rule.account_name.clone(),
        })
    }
}

enum PlanKind {
    Fixed(AccountId),
    Lookup {
        column: String,
        fallbacks: Vec<String>,
        create_if_missing: bool,
    },
    Rules {
        column: String,
        rules: Vec<CompiledRule>,
        fallbacks: Vec<String>,
    },
}

/// One side's mapping compiled into an executable plan
struct AccountSidePlan {
    kind: PlanKind,
}

impl AccountSidePlan {
    fn compile(strategy: &ImportStrategy, field: TransferField) -> Result<Self> {
        let mapping = strategy.mapping(field).ok_or_else(|| {
            Error::strategy(format!(
                "strategy '{}' has no mapping for the {} field",
                strategy.name, field
            ))
        })?;

        let kind = match mapping {
            FieldMapping::HardCodedAccount { account_id } => PlanKind::Fixed(*account_id),
            FieldMapping::AccountLookup {
                column,
                fallback_columns,
                create_if_missing,
            } => PlanKind::Lookup {
                column: column.clone(),
                fallbacks: fallback_columns.clone(),
                create_if_missing: *create_if_missing,
            },
            FieldMapping::RegexAccount {
                column,
                rules,
                fallback_columns,
            } => PlanKind::Rules {
                column: column.clone(),
                rules: rules.iter().map(CompiledRule::compile).collect::<Result<_>>()?,
                fallbacks: fallback_columns.clone(),
            },
            _ => {
                return Err(Error::strategy(format!(
                    "strategy '{}' maps the {} field with an incompatible mapping kind",
                    strategy.name, field
                )))
            }
        };
        Ok(Self { kind })
    }
}

/// Resolves transfer sides to accounts
///
/// Every regex is compiled once at construction and reused for the whole
/// batch. Persisted mappings with patterns that no longer compile are
/// skipped with a warning; they were valid when stored and must not take
/// the import down with them.
pub struct AccountResolver {
    persisted: Vec<CompiledAccountMapping>,
    source: AccountSidePlan,
    target: AccountSidePlan,
}

impl AccountResolver {
    pub fn new(strategy: &ImportStrategy, snapshot: &ImportSnapshot) -> Result<Self> {
        let mut persisted = Vec::new();
        for mapping in snapshot.account_mappings() {
            if mapping.strategy_id != strategy.id {
                continue;
            }
            match RegexBuilder::new(&mapping.pattern)
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => persisted.push(CompiledAccountMapping {
                    column: mapping.column.clone(),
                    regex,
                    account_id: mapping.account_id,
                }),
                Err(e) => warn!(
                    mapping_id = %mapping.id,
                    pattern = %mapping.pattern,
                    "skipping unparseable account mapping: {e}"
                ),
            }
        }

        Ok(Self {
            persisted,
            source: AccountSidePlan::compile(strategy, TransferField::SourceAccount)?,
            target: AccountSidePlan::compile(strategy, TransferField::TargetAccount)?,
        })
    }

    /// Resolve one side of the transfer from a row
    pub fn resolve(
        &self,
        side: TransferSide,
        row: &CsvRow,
        columns: &ColumnIndex,
        snapshot: &ImportSnapshot,
    ) -> Result<AccountResolution> {
        let plan = match side {
            TransferSide::Source => &self.source,
            TransferSide::Target => &self.target,
        };

        match &plan.kind {
            PlanKind::Fixed(id) => Ok(AccountResolution::Existing(*id)),
            PlanKind::Lookup {
                column,
                fallbacks,
                create_if_missing,
            } => {
                let primary = columns.cell(row, column)?.trim();
                if let Some(id) = self.persisted_match(column, primary) {
                    return Ok(AccountResolution::Existing(id));
                }
                self.resolve_by_value(
                    (column, primary),
                    fallbacks,
                    *create_if_missing,
                    row,
                    columns,
                    snapshot,
                )
            }
            PlanKind::Rules {
                column,
                rules,
                fallbacks,
            } => {
                let primary = columns.cell(row, column)?.trim();
                if let Some(id) = self.persisted_match(column, primary) {
                    return Ok(AccountResolution::Existing(id));
                }
                if !primary.is_empty() {
                    if let Some(rule) = rules.iter().find(|r| r.regex.is_match(primary)) {
                        let discovered = DiscoveredAccountMapping {
                            column: column.clone(),
                            csv_value: primary.to_string(),
                            account_name: rule.account_name.clone(),
                            pattern: Some(rule.pattern.clone()),
                        };
                        return Ok(lookup_or_new(snapshot, &rule.account_name, discovered));
                    }
                }
                self.resolve_by_value((column, primary), fallbacks, true, row, columns, snapshot)
            }
        }
    }

    /// First persisted mapping for the column that matches the value,
    /// ascending by mapping id
    fn persisted_match(&self, column: &str, value: &str) -> Option<AccountId> {
        if value.is_empty() {
            return None;
        }
        self.persisted
            .iter()
            .find(|m| m.column == column && m.regex.is_match(value))
            .map(|m| m.account_id)
    }

    fn resolve_by_value(
        &self,
        primary: (&str, &str),
        fallbacks: &[String],
        create_if_missing: bool,
        row: &CsvRow,
        columns: &ColumnIndex,
        snapshot: &ImportSnapshot,
    ) -> Result<AccountResolution> {
        let (primary_column, primary_value) = primary;
        let Some((supplying_column, value)) =
            candidate_value(primary_column, primary_value, fallbacks, row, columns)?
        else {
            return Ok(AccountResolution::Placeholder);
        };

        // a mapping learned from a fallback column keeps winning there
        if supplying_column != primary_column {
            if let Some(id) = self.persisted_match(supplying_column, value) {
                return Ok(AccountResolution::Existing(id));
            }
        }

        if let Some(id) = snapshot.account_id_by_name(value) {
            return Ok(AccountResolution::Existing(id));
        }

        if !create_if_missing {
            return Ok(AccountResolution::Placeholder);
        }

        Ok(AccountResolution::New {
            name: value.to_string(),
            discovered: DiscoveredAccountMapping {
                column: supplying_column.to_string(),
                csv_value: value.to_string(),
                account_name: value.to_string(),
                pattern: None,
            },
        })
    }
}

/// First non-blank value among the primary column and its fallbacks,
/// together with the column that supplied it
fn candidate_value<'a>(
    primary_column: &'a str,
    primary_value: &'a str,
    fallbacks: &'a [String],
    row: &'a CsvRow,
    columns: &ColumnIndex,
) -> Result<Option<(&'a str, &'a str)>> {
    if !primary_value.is_empty() {
        return Ok(Some((primary_column, primary_value)));
    }
    for fallback in fallbacks {
        let value = columns.cell(row, fallback)?.trim();
        if !value.is_empty() {
            return Ok(Some((fallback.as_str(), value)));
        }
    }
    Ok(None)
}

fn lookup_or_new(
    snapshot: &ImportSnapshot,
    name: &str,
    discovered: DiscoveredAccountMapping,
) -> AccountResolution {
    match snapshot.account_id_by_name(name) {
        Some(id) => AccountResolution::Existing(id),
        None => AccountResolution::New {
            name: name.to_string(),
            discovered,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, CsvAccountMapping, CsvColumn, MappingId, StrategyId};

    fn index(names: &[&str]) -> ColumnIndex {
        let columns: Vec<CsvColumn> = names
            .iter()
            .enumerate()
            .map(|(i, n)| CsvColumn::new(i, *n))
            .collect();
        ColumnIndex::new(&columns)
    }

    fn row(cells: &[&str]) -> CsvRow {
        CsvRow::new(0, cells.iter().map(|c| c.to_string()).collect())
    }

    fn strategy(target: FieldMapping) -> ImportStrategy {
        let mut strategy = ImportStrategy::new(StrategyId(1), "Test");
        strategy.field_mappings.insert(
            TransferField::SourceAccount,
            FieldMapping::HardCodedAccount {
                account_id: AccountId(1),
            },
        );
        strategy
            .field_mappings
            .insert(TransferField::TargetAccount, target);
        strategy
    }

    fn snapshot(accounts: &[(i64, &str)], mappings: Vec<CsvAccountMapping>) -> ImportSnapshot {
        ImportSnapshot::build(
            accounts
                .iter()
                .map(|(id, name)| Account::new(AccountId(*id), *name))
                .collect(),
            vec![],
            vec![],
            mappings,
            vec![],
        )
    }

    fn mapping(id: i64, column: &str, pattern: &str, account: i64) -> CsvAccountMapping {
        CsvAccountMapping::new(
            MappingId(id),
            StrategyId(1),
            column,
            pattern,
            AccountId(account),
        )
    }

    fn resolve_target(
        strategy: &ImportStrategy,
        snapshot: &ImportSnapshot,
        columns: &ColumnIndex,
        row: &CsvRow,
    ) -> AccountResolution {
        let resolver = AccountResolver::new(strategy, snapshot).unwrap();
        resolver
            .resolve(TransferSide::Target, row, columns, snapshot)
            .unwrap()
    }

    #[test]
    fn test_hard_coded_side_ignores_the_row() {
        let strategy = strategy(FieldMapping::HardCodedAccount {
            account_id: AccountId(7),
        });
        let snapshot = snapshot(&[], vec![]);
        let resolution = resolve_target(&strategy, &snapshot, &index(&["Details"]), &row(&[""]));
        assert_eq!(resolution, AccountResolution::Existing(AccountId(7)));
    }

    #[test]
    fn test_persisted_mapping_wins_over_rules() {
        let strategy = strategy(FieldMapping::RegexAccount {
            column: "Details".into(),
            rules: vec![RegexRule::new(".*", "Other")],
            fallback_columns: vec![],
        });
        let snapshot = snapshot(
            &[(2, "Other")],
            vec![mapping(1, "Details", "^direct debit", 10)],
        );

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Details"]),
            &row(&["DIRECT DEBIT ENERGY CO"]),
        );
        assert_eq!(resolution, AccountResolution::Existing(AccountId(10)));
    }

    #[test]
    fn test_lowest_mapping_id_wins() {
        let strategy = strategy(FieldMapping::AccountLookup {
            column: "Details".into(),
            fallback_columns: vec![],
            create_if_missing: true,
        });
        // both patterns match; the mapping created first must win
        let snapshot = snapshot(
            &[],
            vec![
                mapping(9, "Details", "payment", 7),
                mapping(2, "Details", "pay.*", 8),
            ],
        );

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Details"]),
            &row(&["PAYMENT RECEIVED"]),
        );
        assert_eq!(resolution, AccountResolution::Existing(AccountId(8)));
    }

    #[test]
    fn test_rule_match_resolves_existing_account() {
        let strategy = strategy(FieldMapping::RegexAccount {
            column: "Details".into(),
            rules: vec![
                RegexRule::new("^TESCO", "Groceries"),
                RegexRule::new(".*", "Other"),
            ],
            fallback_columns: vec![],
        });
        let snapshot = snapshot(&[(4, "Groceries"), (5, "Other")], vec![]);

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Details"]),
            &row(&["tesco extra 4411"]),
        );
        assert_eq!(resolution, AccountResolution::Existing(AccountId(4)));
    }

    #[test]
    fn test_rule_match_proposes_new_account() {
        let strategy = strategy(FieldMapping::RegexAccount {
            column: "Details".into(),
            rules: vec![RegexRule::new("COFFEE", "Eating Out")],
            fallback_columns: vec![],
        });
        let snapshot = snapshot(&[], vec![]);

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Details"]),
            &row(&["COFFEE SHOP 42"]),
        );
        assert_eq!(
            resolution,
            AccountResolution::New {
                name: "Eating Out".into(),
                discovered: DiscoveredAccountMapping {
                    column: "Details".into(),
                    csv_value: "COFFEE SHOP 42".into(),
                    account_name: "Eating Out".into(),
                    pattern: Some("COFFEE".into()),
                },
            }
        );
    }

    #[test]
    fn test_lookup_walks_fallback_columns() {
        let strategy = strategy(FieldMapping::AccountLookup {
            column: "Payee".into(),
            fallback_columns: vec!["Reference".into(), "Counterparty".into()],
            create_if_missing: true,
        });
        let snapshot = snapshot(&[(6, "Savings")], vec![]);

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Payee", "Reference", "Counterparty"]),
            &row(&["", "", "Savings"]),
        );
        assert_eq!(resolution, AccountResolution::Existing(AccountId(6)));
    }

    #[test]
    fn test_fallback_value_consults_persisted_mappings() {
        let strategy = strategy(FieldMapping::AccountLookup {
            column: "Payee".into(),
            fallback_columns: vec!["Counterparty".into()],
            create_if_missing: true,
        });
        // the learned mapping listens on the fallback column
        let snapshot = snapshot(&[], vec![mapping(1, "Counterparty", "^ACME", 9)]);

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Payee", "Counterparty"]),
            &row(&["", "ACME LTD"]),
        );
        assert_eq!(resolution, AccountResolution::Existing(AccountId(9)));
    }

    #[test]
    fn test_unknown_name_becomes_discovery() {
        let strategy = strategy(FieldMapping::AccountLookup {
            column: "Payee".into(),
            fallback_columns: vec![],
            create_if_missing: true,
        });
        let snapshot = snapshot(&[], vec![]);

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Payee"]),
            &row(&["New Counterparty"]),
        );
        assert_eq!(
            resolution,
            AccountResolution::New {
                name: "New Counterparty".into(),
                discovered: DiscoveredAccountMapping {
                    column: "Payee".into(),
                    csv_value: "New Counterparty".into(),
                    account_name: "New Counterparty".into(),
                    pattern: None,
                },
            }
        );
    }

    #[test]
    fn test_create_if_missing_false_degrades_to_placeholder() {
        let strategy = strategy(FieldMapping::AccountLookup {
            column: "Payee".into(),
            fallback_columns: vec![],
            create_if_missing: false,
        });
        let snapshot = snapshot(&[], vec![]);

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Payee"]),
            &row(&["Unknown Shop"]),
        );
        assert_eq!(resolution, AccountResolution::Placeholder);
    }

    #[test]
    fn test_blank_everywhere_gives_placeholder() {
        let strategy = strategy(FieldMapping::AccountLookup {
            column: "Payee".into(),
            fallback_columns: vec!["Reference".into()],
            create_if_missing: true,
        });
        let snapshot = snapshot(&[], vec![]);

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Payee", "Reference"]),
            &row(&["  ", ""]),
        );
        assert_eq!(resolution, AccountResolution::Placeholder);
    }

    #[test]
    fn test_unparseable_persisted_mapping_is_skipped() {
        let strategy = strategy(FieldMapping::AccountLookup {
            column: "Details".into(),
            fallback_columns: vec![],
            create_if_missing: true,
        });
        let snapshot = snapshot(
            &[],
            vec![
                mapping(1, "Details", "[unclosed", 3),
                mapping(2, "Details", "rent", 4),
            ],
        );

        let resolution = resolve_target(
            &strategy,
            &snapshot,
            &index(&["Details"]),
            &row(&["RENT MARCH"]),
        );
        assert_eq!(resolution, AccountResolution::Existing(AccountId(4)));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let strategy = strategy(FieldMapping::AccountLookup {
            column: "Payee".into(),
            fallback_columns: vec![],
            create_if_missing: true,
        });
        let snapshot = snapshot(&[], vec![]);
        let resolver = AccountResolver::new(&strategy, &snapshot).unwrap();

        let err = resolver
            .resolve(
                TransferSide::Target,
                &row(&["x"]),
                &index(&["Details"]),
                &snapshot,
            )
            .unwrap_err();
        assert!(err.to_string().contains("Column not found: Payee"));
    }
}
