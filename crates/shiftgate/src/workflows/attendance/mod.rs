//! Daily attendance cycle: entry kinds, derived shift state and worker timesheets.

pub mod domain;
pub mod state;
pub mod timesheet;

pub use domain::{EntryType, PhotoRef, TimeEntry};
pub use state::{last_entry_on, InvalidTransition, ShiftState};
pub use timesheet::{derive_timesheet, TimesheetUpsert};
