//! Field mapping resolution
//!
//! One row plus one mapping in, one typed value out. The match over
//! [`FieldMapping`] is total: every mapping kind has exactly one arm here,
//! and the compiler refuses a new kind until it gets one.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::warn;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AmountColumns, ColumnIndex, CsvRow, CurrencyId, FieldMapping, ImportSnapshot, TransferField,
};
use crate::services::accounts::{AccountResolution, AccountResolver, TransferSide};
use crate::services::amounts;

/// Per-row state the later fields depend on
///
/// The mapper resolves currency and timezone first and threads the results
/// through here; amount parsing needs the currency's scale and timestamp
/// parsing needs the offset.
#[derive(Debug, Clone, Copy)]
pub struct RowContext {
    /// Minor units per major unit of the row's currency
    pub minor_unit: i64,
    /// Offset from UTC in minutes, east positive
    pub utc_offset_minutes: i32,
}

impl RowContext {
    /// Context for resolving the fields that feed the real context
    pub fn initial() -> Self {
        Self {
            minor_unit: 1,
            utc_offset_minutes: 0,
        }
    }
}

/// Value produced by resolving one field mapping against a row
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Account(AccountResolution),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Minor units in the row's currency
    Amount(i64),
    Currency(CurrencyId),
    /// Offset from UTC in minutes
    UtcOffset(i32),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Account(_) => "account",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Amount(_) => "amount",
            Self::Currency(_) => "currency",
            Self::UtcOffset(_) => "timezone offset",
        }
    }

    pub fn into_account(self) -> Result<AccountResolution> {
        match self {
            Self::Account(resolution) => Ok(resolution),
            other => Err(unexpected_kind("account", &other)),
        }
    }

    pub fn into_text(self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(unexpected_kind("text", &other)),
        }
    }

    pub fn into_timestamp(self) -> Result<DateTime<Utc>> {
        match self {
            Self::Timestamp(timestamp) => Ok(timestamp),
            other => Err(unexpected_kind("timestamp", &other)),
        }
    }

    pub fn into_amount(self) -> Result<i64> {
        match self {
            Self::Amount(amount) => Ok(amount),
            other => Err(unexpected_kind("amount", &other)),
        }
    }

    pub fn into_currency(self) -> Result<CurrencyId> {
        match self {
            Self::Currency(id) => Ok(id),
            other => Err(unexpected_kind("currency", &other)),
        }
    }

    pub fn into_utc_offset(self) -> Result<i32> {
        match self {
            Self::UtcOffset(minutes) => Ok(minutes),
            other => Err(unexpected_kind("timezone offset", &other)),
        }
    }
}

fn unexpected_kind(expected: &str, got: &FieldValue) -> Error {
    Error::strategy(format!(
        "expected a {} value, found {}",
        expected,
        got.kind()
    ))
}

/// Resolves field mappings against rows
pub struct FieldResolver<'a> {
    pub columns: &'a ColumnIndex,
    pub snapshot: &'a ImportSnapshot,
    pub accounts: &'a AccountResolver,
}

impl<'a> FieldResolver<'a> {
    /// Resolve one field's mapping against a row
    ///
    /// `field` only matters for the account kinds, which need to know which
    /// transfer side they are filling; strategy validation has already
    /// rejected mappings sitting on an incompatible field.
    pub fn resolve(
        &self,
        field: TransferField,
        mapping: &FieldMapping,
        row: &CsvRow,
        cx: &RowContext,
    ) -> Result<FieldValue> {
        match mapping {
            FieldMapping::HardCodedAccount { .. }
            | FieldMapping::AccountLookup { .. }
            | FieldMapping::RegexAccount { .. } => {
                let side = match field {
                    TransferField::SourceAccount => TransferSide::Source,
                    TransferField::TargetAccount => TransferSide::Target,
                    other => {
                        return Err(Error::strategy(format!(
                            "account mapping bound to the {other} field"
                        )))
                    }
                };
                let resolution = self.accounts.resolve(side, row, self.columns, self.snapshot)?;
                Ok(FieldValue::Account(resolution))
            }

            FieldMapping::DirectColumn { column } => {
                let value = self.columns.cell(row, column)?.trim();
                Ok(FieldValue::Text(value.to_string()))
            }

            FieldMapping::DateTime {
                date_column,
                format,
                time_column,
            } => {
                let date_raw = self.columns.cell(row, date_column)?.trim();
                if date_raw.is_empty() {
                    return Err(Error::date_parse(format!(
                        "blank value in column '{date_column}'"
                    )));
                }
                let text = match time_column {
                    Some(time_column) => {
                        let time_raw = self.columns.cell(row, time_column)?.trim();
                        if time_raw.is_empty() {
                            date_raw.to_string()
                        } else {
                            format!("{date_raw} {time_raw}")
                        }
                    }
                    None => date_raw.to_string(),
                };
                let naive = parse_naive(&text, format)?;
                Ok(FieldValue::Timestamp(to_utc(naive, cx.utc_offset_minutes)))
            }

            FieldMapping::Amount {
                columns,
                negate_values,
                ..
            } => {
                let value = match columns {
                    AmountColumns::Single { column } => {
                        let raw = self.columns.cell(row, column)?;
                        amounts::parse_minor_units(raw, cx.minor_unit)?
                    }
                    AmountColumns::DebitCredit { debit, credit } => {
                        let debit_raw = self.columns.cell(row, debit)?.trim();
                        let credit_raw = self.columns.cell(row, credit)?.trim();
                        if debit_raw.is_empty() && credit_raw.is_empty() {
                            return Err(Error::amount_parse(format!(
                                "both '{debit}' and '{credit}' are blank"
                            )));
                        }
                        let spent = if debit_raw.is_empty() {
                            0
                        } else {
                            amounts::parse_minor_units(debit_raw, cx.minor_unit)?
                        };
                        let received = if credit_raw.is_empty() {
                            0
                        } else {
                            amounts::parse_minor_units(credit_raw, cx.minor_unit)?
                        };
                        received.checked_sub(spent).ok_or_else(|| {
                            Error::amount_parse(format!(
                                "combined '{debit}' and '{credit}' amount is out of range"
                            ))
                        })?
                    }
                };
                let value = if *negate_values {
                    value
                        .checked_neg()
                        .ok_or_else(|| Error::amount_parse("negated amount is out of range"))?
                } else {
                    value
                };
                Ok(FieldValue::Amount(value))
            }

            FieldMapping::HardCodedCurrency { currency_id } => {
                if self.snapshot.currency(*currency_id).is_none() {
                    return Err(Error::currency_not_found(format!("id {currency_id}")));
                }
                Ok(FieldValue::Currency(*currency_id))
            }

            FieldMapping::CurrencyLookup { column } => {
                let raw = self.columns.cell(row, column)?.trim();
                if raw.is_empty() {
                    return Err(Error::currency_not_found(format!(
                        "blank value in column '{column}'"
                    )));
                }
                match self.snapshot.currency_by_code(raw) {
                    Some(currency) => Ok(FieldValue::Currency(currency.id)),
                    None => Err(Error::currency_not_found(raw)),
                }
            }

            FieldMapping::HardCodedTimezone { timezone_id } => {
                match self.snapshot.timezone(*timezone_id) {
                    Some(timezone) => Ok(FieldValue::UtcOffset(timezone.utc_offset_minutes)),
                    None => {
                        warn!(
                            timezone_id = %timezone_id,
                            "unknown timezone, treating timestamps as UTC"
                        );
                        Ok(FieldValue::UtcOffset(0))
                    }
                }
            }

            FieldMapping::TimezoneLookup { column } => {
                let raw = self.columns.cell(row, column)?.trim();
                match self.snapshot.timezone_by_name(raw) {
                    Some(timezone) => Ok(FieldValue::UtcOffset(timezone.utc_offset_minutes)),
                    None => {
                        warn!(zone = %raw, "unknown timezone, treating timestamps as UTC");
                        Ok(FieldValue::UtcOffset(0))
                    }
                }
            }
        }
    }
}

/// Parse with the strategy's format, falling back to date-at-midnight for
/// formats that only describe a date
fn parse_naive(text: &str, format: &str) -> Result<NaiveDateTime> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
        return Ok(datetime);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, format) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(Error::date_parse(format!(
        "'{text}' does not match format '{format}'"
    )))
}

/// Qualify a naive local timestamp with a UTC offset
///
/// Out-of-range offsets fall back to treating the timestamp as UTC.
fn to_utc(naive: NaiveDateTime, offset_minutes: i32) -> DateTime<Utc> {
    match FixedOffset::east_opt(offset_minutes * 60)
        .and_then(|offset| offset.from_local_datetime(&naive).single())
    {
        Some(datetime) => datetime.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}
