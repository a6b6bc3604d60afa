use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;

use crate::workflows::attendance::{last_entry_on, EntryType, TimeEntry, TimesheetUpsert};
use crate::workflows::geofence::EntityRef;

/// One atomic attendance write: the entry, the state it was decided against,
/// and the worker timesheet row it implies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceWrite {
    pub entry: TimeEntry,
    pub expected_last: Option<EntryType>,
    pub timesheet: Option<TimesheetUpsert>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("attendance changed concurrently: expected last entry {expected:?}, found {found:?}")]
    Conflict {
        expected: Option<EntryType>,
        found: Option<EntryType>,
    },
    #[error("attendance write failed: {0}")]
    WriteFailed(String),
}

impl SinkError {
    pub const fn code(&self) -> &'static str {
        match self {
            SinkError::Conflict { .. } => "conflict",
            SinkError::WriteFailed(_) => "write_failed",
        }
    }
}

/// Persistence collaborator for time entries and worker timesheets.
pub trait AttendanceSink: Send + Sync {
    fn entries_for_day(
        &self,
        entity: &EntityRef,
        day: NaiveDate,
    ) -> impl Future<Output = Result<Vec<TimeEntry>, SinkError>> + Send;

    /// Appends the entry (and timesheet row) only if the entity's latest entry
    /// for that day still equals `expected_last`. Nothing is written on error.
    fn commit(
        &self,
        write: AttendanceWrite,
    ) -> impl Future<Output = Result<TimeEntry, SinkError>> + Send;
}

#[derive(Debug, Default)]
struct Ledger {
    entries: HashMap<EntityRef, Vec<TimeEntry>>,
    timesheets: BTreeMap<(String, NaiveDate), TimesheetUpsert>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryAttendanceSink {
    ledger: Arc<Mutex<Ledger>>,
}

impl InMemoryAttendanceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, entity: &EntityRef) -> Vec<TimeEntry> {
        self.ledger
            .lock()
            .map(|ledger| ledger.entries.get(entity).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn timesheet(&self, worker_id: &str, day: NaiveDate) -> Option<TimesheetUpsert> {
        self.ledger
            .lock()
            .ok()
            .and_then(|ledger| ledger.timesheets.get(&(worker_id.to_string(), day)).cloned())
    }

    /// Appends without the compare step; used to seed fixtures.
    pub fn seed(&self, entry: TimeEntry) -> Result<(), SinkError> {
        let mut ledger = self.lock()?;
        ledger
            .entries
            .entry(entry.entity.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Ledger>, SinkError> {
        self.ledger
            .lock()
            .map_err(|_| SinkError::WriteFailed("attendance ledger lock poisoned".to_string()))
    }

    fn day_entries(
        &self,
        entity: &EntityRef,
        day: NaiveDate,
    ) -> Result<Vec<TimeEntry>, SinkError> {
        let ledger = self.lock()?;
        Ok(ledger
            .entries
            .get(entity)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.timestamp.date() == day)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn append(&self, write: AttendanceWrite) -> Result<TimeEntry, SinkError> {
        let mut ledger = self.lock()?;
        let day = write.entry.timestamp.date();
        let found = ledger
            .entries
            .get(&write.entry.entity)
            .and_then(|entries| last_entry_on(entries, day));
        if found != write.expected_last {
            return Err(SinkError::Conflict {
                expected: write.expected_last,
                found,
            });
        }

        if let Some(row) = write.timesheet {
            ledger
                .timesheets
                .insert((row.worker_id.clone(), row.work_date), row);
        }
        ledger
            .entries
            .entry(write.entry.entity.clone())
            .or_default()
            .push(write.entry.clone());
        Ok(write.entry)
    }
}

impl AttendanceSink for InMemoryAttendanceSink {
    fn entries_for_day(
        &self,
        entity: &EntityRef,
        day: NaiveDate,
    ) -> impl Future<Output = Result<Vec<TimeEntry>, SinkError>> + Send {
        let entries = self.day_entries(entity, day);
        async move { entries }
    }

    fn commit(
        &self,
        write: AttendanceWrite,
    ) -> impl Future<Output = Result<TimeEntry, SinkError>> + Send {
        async move { self.append(write) }
    }
}
