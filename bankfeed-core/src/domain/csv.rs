//! CSV headers and rows as handed over by the tokenizer
//!
//! The engine never reads files. A separate CSV parser (whatever the
//! caller uses) produces a header array and row arrays; these types carry
//! them through the pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};
use super::transfer::ImportStatus;

/// A CSV header cell: column name plus zero-based position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvColumn {
    pub position: usize,
    pub name: String,
}

impl CsvColumn {
    pub fn new(position: usize, name: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
        }
    }
}

/// One data row of a CSV file
///
/// `row_index` is the zero-based position in the source file and survives
/// into every result the engine produces, so errors can be traced back to
/// the file. `status` carries the outcome of an earlier run when a
/// partially imported file comes through again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvRow {
    pub row_index: usize,
    pub cells: Vec<String>,
    #[serde(default)]
    pub status: Option<ImportStatus>,
}

impl CsvRow {
    pub fn new(row_index: usize, cells: Vec<String>) -> Self {
        Self {
            row_index,
            cells,
            status: None,
        }
    }

    /// Cell content at a column position; blank when the row is short
    pub fn cell(&self, position: usize) -> &str {
        self.cells.get(position).map(String::as_str).unwrap_or("")
    }

    /// Whether a fresh run should map this row
    ///
    /// Rows that already imported cleanly keep their earlier result; rows
    /// that errored or were never touched get processed.
    pub fn needs_processing(&self) -> bool {
        matches!(self.status, None | Some(ImportStatus::Error))
    }
}

/// Name to position lookup, built once per import session
///
/// Header names are matched case-sensitively. When a file repeats a header
/// name the first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    by_name: HashMap<String, usize>,
    names: Vec<String>,
}

impl ColumnIndex {
    pub fn new(columns: &[CsvColumn]) -> Self {
        let mut by_name = HashMap::with_capacity(columns.len());
        let mut names = Vec::with_capacity(columns.len());
        for column in columns {
            by_name
                .entry(column.name.clone())
                .or_insert(column.position);
            names.push(column.name.clone());
        }
        Self { by_name, names }
    }

    /// Position of a column by exact header name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Header names in file order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Read a named cell from a row
    pub fn cell<'r>(&self, row: &'r CsvRow, name: &str) -> Result<&'r str> {
        let position = self
            .position(name)
            .ok_or_else(|| Error::column_not_found(name))?;
        Ok(row.cell(position))
    }
}
