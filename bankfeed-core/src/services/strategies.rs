//! Strategy selection for a parsed header set
//!
//! Matching is deliberately strict: a strategy claims a file only when its
//! identification columns equal the header set exactly. Banks change their
//! export layouts, and a silently half-matching strategy would map columns
//! wrongly; a non-match that makes the user pick is the safer failure.

use serde::Serialize;
use tracing::debug;

use crate::domain::ImportStrategy;

/// First strategy in catalog order that claims the header set
pub fn find_matching_strategy<'a>(
    headers: &[String],
    strategies: &'a [ImportStrategy],
) -> Option<&'a ImportStrategy> {
    let found = strategies.iter().find(|s| s.matches_headers(headers));
    match found {
        Some(strategy) => debug!(strategy = %strategy.name, "matched import strategy"),
        None => debug!(
            header_count = headers.len(),
            "no import strategy matches the header set"
        ),
    }
    found
}

/// Every strategy that claims the header set, in catalog order
pub fn find_all_matching_strategies<'a>(
    headers: &[String],
    strategies: &'a [ImportStrategy],
) -> Vec<&'a ImportStrategy> {
    strategies
        .iter()
        .filter(|s| s.matches_headers(headers))
        .collect()
}

/// Best-guess columns for drafting a strategy over an unknown layout
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedColumns {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit: Option<String>,
}

/// Guess which headers carry date, amount and description
///
/// For seeding a draft strategy when no catalog strategy matches. Plain
/// substring matching over lowercased headers; a single amount column is
/// preferred, paired debit/credit columns are only suggested without one.
pub fn suggest_columns(headers: &[String]) -> SuggestedColumns {
    let date_patterns = [
        "date", "transaction date", "trans date", "txn date", "txndate", "posted", "post date",
        "dt",
    ];
    let desc_patterns = [
        "description",
        "desc",
        "memo",
        "payee",
        "merchant",
        "details",
        "narration",
    ];
    let amount_patterns = ["amount", "amt", "total", "transaction amount"];
    let debit_patterns = ["debit", "dr", "withdrawal", "debit amount", "paid out"];
    let credit_patterns = ["credit", "cr", "deposit", "credit amount", "paid in"];

    let matches = |header: &str, patterns: &[&str]| {
        let lower = header.to_lowercase();
        patterns.iter().any(|p| lower.contains(p))
    };

    let mut suggested = SuggestedColumns::default();

    for header in headers {
        if matches(header, &date_patterns) {
            suggested.date = Some(header.clone());
            break;
        }
    }

    for header in headers {
        if matches(header, &amount_patterns) {
            suggested.amount = Some(header.clone());
            break;
        }
    }

    if suggested.amount.is_none() {
        for header in headers {
            if suggested.debit.is_none() && matches(header, &debit_patterns) {
                suggested.debit = Some(header.clone());
            } else if suggested.credit.is_none() && matches(header, &credit_patterns) {
                suggested.credit = Some(header.clone());
            }
        }
    }

    for header in headers {
        if suggested.date.as_ref() == Some(header) {
            continue;
        }
        if matches(header, &desc_patterns) {
            suggested.description = Some(header.clone());
            break;
        }
    }

    if suggested.description.is_none() {
        let fallback_patterns = ["name", "type", "ref", "reference", "category"];
        for header in headers {
            if suggested.date.as_ref() == Some(header) {
                continue;
            }
            if matches(header, &fallback_patterns) {
                suggested.description = Some(header.clone());
                break;
            }
        }
    }

    suggested
}
