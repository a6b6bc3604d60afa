use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{EntryType, TimeEntry};

/// Position in the daily attendance cycle, derived from the latest entry of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftState {
    NotStarted,
    ClockedIn,
    OnBreak,
    ClockedOut,
}

/// Requested action is not legal from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} while {}", requested.code(), from.label())]
pub struct InvalidTransition {
    pub from: ShiftState,
    pub requested: EntryType,
}

impl ShiftState {
    pub const fn from_last(last: Option<EntryType>) -> Self {
        match last {
            None => Self::NotStarted,
            Some(EntryType::ClockIn) | Some(EntryType::BreakEnd) => Self::ClockedIn,
            Some(EntryType::BreakStart) => Self::OnBreak,
            Some(EntryType::ClockOut) => Self::ClockedOut,
        }
    }

    /// Latest entry on `day` decides the state; entries from other days are ignored.
    pub fn for_day<'a, I>(entries: I, day: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a TimeEntry>,
    {
        Self::from_last(last_entry_on(entries, day))
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not clocked in",
            Self::ClockedIn => "clocked in",
            Self::OnBreak => "on break",
            Self::ClockedOut => "clocked out",
        }
    }

    pub const fn legal_actions(self) -> &'static [EntryType] {
        match self {
            Self::NotStarted => &[EntryType::ClockIn],
            Self::ClockedIn => &[EntryType::BreakStart, EntryType::ClockOut],
            Self::OnBreak => &[EntryType::BreakEnd],
            Self::ClockedOut => &[],
        }
    }

    pub fn allows(self, action: EntryType) -> bool {
        self.legal_actions().contains(&action)
    }

    pub fn apply(self, action: EntryType) -> Result<Self, InvalidTransition> {
        if self.allows(action) {
            Ok(Self::from_last(Some(action)))
        } else {
            Err(InvalidTransition {
                from: self,
                requested: action,
            })
        }
    }
}

/// Type of the most recent entry recorded on `day`.
pub fn last_entry_on<'a, I>(entries: I, day: NaiveDate) -> Option<EntryType>
where
    I: IntoIterator<Item = &'a TimeEntry>,
{
    entries
        .into_iter()
        .filter(|entry| entry.timestamp.date() == day)
        .max_by_key(|entry| entry.timestamp)
        .map(|entry| entry.entry_type)
}
