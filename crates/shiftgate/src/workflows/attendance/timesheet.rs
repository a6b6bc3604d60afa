use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::domain::{EntryType, TimeEntry};
use crate::workflows::geofence::{EntityKind, EntityRef};

/// Daily timesheet row maintained for worker-kind entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetUpsert {
    pub worker_id: String,
    pub work_date: NaiveDate,
    pub time_in: NaiveDateTime,
    pub time_out: Option<NaiveDateTime>,
    pub break_minutes: i64,
    pub hours_worked: f64,
}

/// Timesheet row implied by recording `entry_type` at `at`, given the entries
/// already stored for that day. Only worker `clock_in`/`clock_out` produce one.
pub fn derive_timesheet(
    entity: &EntityRef,
    entry_type: EntryType,
    at: NaiveDateTime,
    day_entries: &[TimeEntry],
) -> Option<TimesheetUpsert> {
    if entity.kind != EntityKind::Worker {
        return None;
    }

    let work_date = at.date();
    match entry_type {
        EntryType::ClockIn => Some(TimesheetUpsert {
            worker_id: entity.id.clone(),
            work_date,
            time_in: at,
            time_out: None,
            break_minutes: 0,
            hours_worked: 0.0,
        }),
        EntryType::ClockOut => {
            let mut ordered: Vec<&TimeEntry> = day_entries
                .iter()
                .filter(|entry| entry.timestamp.date() == work_date)
                .collect();
            ordered.sort_by_key(|entry| entry.timestamp);

            let time_in = ordered
                .iter()
                .find(|entry| entry.entry_type == EntryType::ClockIn)
                .map(|entry| entry.timestamp)?;
            let break_minutes = break_minutes(&ordered, at);
            let worked_minutes = ((at - time_in).num_minutes() - break_minutes).max(0);

            Some(TimesheetUpsert {
                worker_id: entity.id.clone(),
                work_date,
                time_in,
                time_out: Some(at),
                break_minutes,
                hours_worked: round_hours(worked_minutes),
            })
        }
        EntryType::BreakStart | EntryType::BreakEnd => None,
    }
}

/// An unterminated break is closed at `until`.
fn break_minutes(ordered: &[&TimeEntry], until: NaiveDateTime) -> i64 {
    let mut total = 0;
    let mut open: Option<NaiveDateTime> = None;
    for entry in ordered {
        match entry.entry_type {
            EntryType::BreakStart => open = Some(entry.timestamp),
            EntryType::BreakEnd => {
                if let Some(start) = open.take() {
                    total += (entry.timestamp - start).num_minutes();
                }
            }
            EntryType::ClockIn | EntryType::ClockOut => {}
        }
    }
    if let Some(start) = open {
        total += (until - start).num_minutes();
    }
    total
}

fn round_hours(minutes: i64) -> f64 {
    (minutes as f64 / 60.0 * 100.0).round() / 100.0
}
