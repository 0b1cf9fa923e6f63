//! Strategy catalog persistence
//!
//! Catalogs are stored as one strategies.json file:
//! ```json
//! {
//!   "strategies": [ { "id": 1, "name": "My Bank", ... } ],
//!   "accountMappings": [ { "id": 1, "strategyId": 1, ... } ]
//! }
//! ```
//! The domain and services stay free of I/O; this module is the one place
//! that touches the filesystem.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountId, CsvAccountMapping, DiscoveredAccountMapping, ImportStrategy, MappingId, StrategyId,
};

/// Every strategy and learned account mapping known to the application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCatalog {
    #[serde(default)]
    pub strategies: Vec<ImportStrategy>,
    #[serde(default)]
    pub account_mappings: Vec<CsvAccountMapping>,
}

impl StrategyCatalog {
    /// Load a catalog, treating a missing file as an empty one
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read strategy catalog: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse strategy catalog: {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize strategy catalog")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write strategy catalog: {:?}", path))
    }

    pub fn strategy_by_name(&self, name: &str) -> Option<&ImportStrategy> {
        self.strategies.iter().find(|s| s.name == name)
    }

    /// Persist a mapping discovered during an import run
    ///
    /// Rule discoveries keep the rule's pattern. Plain lookups get an
    /// anchored, escaped pattern, so only the exact value seen here will
    /// match in later runs.
    pub fn add_account_mapping(
        &mut self,
        strategy_id: StrategyId,
        discovered: &DiscoveredAccountMapping,
        account_id: AccountId,
    ) -> MappingId {
        let next_id = self
            .account_mappings
            .iter()
            .map(|m| m.id.0)
            .max()
            .unwrap_or(0)
            + 1;
        let pattern = match &discovered.pattern {
            Some(pattern) => pattern.clone(),
            None => format!("^{}$", regex::escape(&discovered.csv_value)),
        };
        let mapping = CsvAccountMapping::new(
            MappingId(next_id),
            strategy_id,
            &discovered.column,
            pattern,
            account_id,
        );
        let id = mapping.id;
        self.account_mappings.push(mapping);
        id
    }
}
