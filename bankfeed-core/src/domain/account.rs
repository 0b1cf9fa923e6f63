//! Account domain model

use serde::{Deserialize, Serialize};

use super::ids::AccountId;

/// A financial account transfer sides can resolve to
///
/// Only what the import engine reads is carried here; balances, grouping
/// and archival state stay with the owning application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    /// Display name, matched case-sensitively during lookup
    pub name: String,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
