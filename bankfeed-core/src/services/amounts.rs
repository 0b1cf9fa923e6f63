//! Amount parsing into fixed-point minor units
//!
//! Bank exports are messy: currency symbols and codes hug the number,
//! thousands get comma separators, negatives show up as a leading minus, a
//! trailing minus, or accounting parentheses. The parser tolerates all of
//! that at the edges of the value and rejects anything garbled inside it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::result::{Error, Result};

/// Parse a CSV amount cell into minor units at the given scale
///
/// `minor_unit` is units per major unit (100 for cent-based currencies, 1
/// for zero-decimal ones). Fractions beyond the scale round half away from
/// zero, so `"0.005"` at scale 100 becomes 1 minor unit.
pub fn parse_minor_units(raw: &str, minor_unit: i64) -> Result<i64> {
    let value = parse_decimal(raw)?;
    let scaled = value
        .checked_mul(Decimal::from(minor_unit))
        .ok_or_else(|| Error::amount_parse(format!("'{raw}' is out of range")))?;
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| Error::amount_parse(format!("'{raw}' is out of range")))
}

/// Parse a CSV amount cell into a decimal, tolerating bank formatting
pub fn parse_decimal(raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::amount_parse("blank value"));
    }

    // Accounting notation: (100.00) means -100.00
    let (mut negative, mut body) =
        if trimmed.len() >= 2 && trimmed.starts_with('(') && trimmed.ends_with(')') {
            (true, trimmed[1..trimmed.len() - 1].trim())
        } else {
            (false, trimmed)
        };

    // Trailing minus, e.g. "50.00-"
    if let Some(rest) = body.strip_suffix('-') {
        negative = true;
        body = rest.trim_end();
    }

    // A leading sign can sit before or after a currency symbol: -£50, £-50
    for _ in 0..2 {
        if let Some(rest) = body.strip_prefix('-') {
            negative = true;
            body = rest.trim_start();
        } else if let Some(rest) = body.strip_prefix('+') {
            body = rest.trim_start();
        }
        body = body.trim_start_matches(|c: char| {
            !c.is_ascii_digit() && c != '.' && c != ',' && c != '-' && c != '+'
        });
    }
    body = body.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.' && c != ',');

    // Commas are thousands separators; anything else left over is garbage
    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::amount_parse(format!("no digits in '{raw}'")));
    }
    if let Some(bad) = cleaned.chars().find(|c| !c.is_ascii_digit() && *c != '.') {
        return Err(Error::amount_parse(format!(
            "unexpected character '{bad}' in '{raw}'"
        )));
    }

    let normalized = if cleaned.starts_with('.') {
        format!("0{cleaned}")
    } else {
        cleaned
    };

    let value: Decimal = normalized
        .parse()
        .map_err(|_| Error::amount_parse(format!("'{raw}' is not a valid number")))?;

    Ok(if negative { -value } else { value })
}
