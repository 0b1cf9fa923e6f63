//! Currency domain model

use serde::{Deserialize, Serialize};

use super::ids::CurrencyId;

/// A currency with its fixed-point scale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id: CurrencyId,
    /// ISO 4217 code, normalized to uppercase
    pub code: String,
    /// Minor units per major unit: 100 for cent-based currencies,
    /// 1 for zero-decimal ones like JPY
    pub minor_unit: i64,
}

impl Currency {
    pub fn new(id: CurrencyId, code: impl Into<String>, minor_unit: i64) -> Self {
        Self {
            id,
            code: Self::normalize_code(&code.into()),
            minor_unit,
        }
    }

    /// Normalize a currency code for lookup: trimmed, uppercase
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }
}
