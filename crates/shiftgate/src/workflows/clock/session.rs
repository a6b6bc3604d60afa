use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;

use super::error::ClockActionError;
use crate::workflows::attendance::{ShiftState, TimeEntry, TimesheetUpsert};
use crate::workflows::geofence::{EntityRef, GeofenceMatch};

/// Where a session will resume on its next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    /// Geofence not yet passed.
    Locating,
    /// Geofence passed; waiting for an accepted photo.
    Capturing,
    Committed,
    Cancelled,
}

impl SessionStage {
    pub const fn label(self) -> &'static str {
        match self {
            SessionStage::Locating => "locating",
            SessionStage::Capturing => "capturing",
            SessionStage::Committed => "committed",
            SessionStage::Cancelled => "cancelled",
        }
    }
}

/// Outcome of a committed clock action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedEntry {
    pub entry: TimeEntry,
    pub location: GeofenceMatch,
    pub timesheet: Option<TimesheetUpsert>,
    pub state: ShiftState,
}

/// Live generation per entity. A session is current only while its generation is registered.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionRegistry {
    live: Arc<Mutex<HashMap<EntityRef, u64>>>,
    next: Arc<AtomicU64>,
}

impl SessionRegistry {
    pub(crate) fn claim(&self, entity: &EntityRef) -> Result<u64, ClockActionError> {
        let mut live = self.lock();
        if live.contains_key(entity) {
            return Err(ClockActionError::SessionInProgress(entity.clone()));
        }
        let generation = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        live.insert(entity.clone(), generation);
        Ok(generation)
    }

    pub(crate) fn release(&self, entity: &EntityRef, generation: u64) {
        let mut live = self.lock();
        if live.get(entity) == Some(&generation) {
            live.remove(entity);
        }
    }

    pub(crate) fn is_current(&self, entity: &EntityRef, generation: u64) -> bool {
        self.lock().get(entity) == Some(&generation)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EntityRef, u64>> {
        match self.live.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Cloneable handle that abandons a session from outside the task driving it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    signal: Arc<watch::Sender<bool>>,
    registry: SessionRegistry,
    entity: EntityRef,
    generation: u64,
}

impl CancelHandle {
    pub(crate) fn new(registry: SessionRegistry, entity: EntityRef, generation: u64) -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
            registry,
            entity,
            generation,
        }
    }

    /// Retires the generation and wakes any pending await. Idempotent.
    pub fn cancel(&self) {
        self.signal.send_replace(true);
        self.registry.release(&self.entity, self.generation);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow() || !self.registry.is_current(&self.entity, self.generation)
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.signal.subscribe()
    }

    pub(crate) fn release(&self) {
        self.registry.release(&self.entity, self.generation);
    }
}
