use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::workflows::geofence::EntityRef;

/// Shift-boundary event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    ClockIn,
    BreakStart,
    BreakEnd,
    ClockOut,
}

impl EntryType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::ClockIn,
            Self::BreakStart,
            Self::BreakEnd,
            Self::ClockOut,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::ClockIn => "clock_in",
            Self::BreakStart => "break_start",
            Self::BreakEnd => "break_end",
            Self::ClockOut => "clock_out",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ClockIn => "Clock In",
            Self::BreakStart => "Start Break",
            Self::BreakEnd => "End Break",
            Self::ClockOut => "Clock Out",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|entry| entry.code().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Storage key of the photo captured for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn for_entry(entity: &EntityRef, entry_type: EntryType, timestamp: NaiveDateTime) -> Self {
        Self(format!(
            "attendance/{}/{}/{}-{}.rgba",
            entity.kind.label(),
            entity.id,
            timestamp.format("%Y%m%dT%H%M%S"),
            entry_type.code()
        ))
    }
}

/// Append-only attendance event, stamped in local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub entity: EntityRef,
    pub entry_type: EntryType,
    pub timestamp: NaiveDateTime,
    pub photo: PhotoRef,
}
