//! Timezone domain model

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use super::ids::TimezoneId;

/// A timezone as stored by the owning application
///
/// The repository layer resolves zone names to a UTC offset before handing
/// them over; the engine only needs the offset to qualify naive timestamps
/// read from CSV cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timezone {
    pub id: TimezoneId,
    /// Zone name as users reference it, e.g. "Europe/London"
    pub name: String,
    /// Offset from UTC in minutes, east positive
    pub utc_offset_minutes: i32,
}

impl Timezone {
    pub fn new(id: TimezoneId, name: impl Into<String>, utc_offset_minutes: i32) -> Self {
        Self {
            id,
            name: name.into(),
            utc_offset_minutes,
        }
    }

    /// Fixed offset for timestamp conversion, `None` if out of range
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
    }
}
