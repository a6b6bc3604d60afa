use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::domain::{EntityRef, LocationId, WorkLocation};

/// Read-only view over configured work locations and entity assignments.
///
/// Implementations select the assignment table from `EntityRef::kind`, so the
/// resolver stays identical for workers and employees. Lookups are async so a
/// remote backend never holds an executor thread.
pub trait LocationDirectory: Send + Sync {
    fn location(
        &self,
        id: &LocationId,
    ) -> impl Future<Output = Result<Option<WorkLocation>, DirectoryError>> + Send;
    fn active_locations(
        &self,
    ) -> impl Future<Output = Result<Vec<WorkLocation>, DirectoryError>> + Send;
    /// Many-to-many assignments, in the directory's own order.
    fn assigned_locations(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<Vec<LocationId>, DirectoryError>> + Send;
    /// Legacy single `assigned_location_id` column.
    fn legacy_location(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<Option<LocationId>, DirectoryError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("location directory unavailable: {0}")]
    Unavailable(String),
}

/// Serializable snapshot used by the in-memory directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub locations: Vec<WorkLocation>,
    #[serde(default)]
    pub assignments: Vec<AssignmentRow>,
    #[serde(default)]
    pub legacy: Vec<LegacyAssignmentRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub entity: EntityRef,
    pub location_id: LocationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAssignmentRow {
    pub entity: EntityRef,
    pub location_id: LocationId,
}

/// Directory backed by plain collections; used by the CLI, the demo service, and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocationDirectory {
    locations: Vec<WorkLocation>,
    assignments: BTreeMap<EntityRef, Vec<LocationId>>,
    legacy: BTreeMap<EntityRef, LocationId>,
}

impl InMemoryLocationDirectory {
    pub fn new(locations: Vec<WorkLocation>) -> Self {
        Self {
            locations,
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let mut directory = Self::new(snapshot.locations);
        for row in snapshot.assignments {
            directory.assign(row.entity, row.location_id);
        }
        for row in snapshot.legacy {
            directory.set_legacy(row.entity, row.location_id);
        }
        directory
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let snapshot: DirectorySnapshot = serde_json::from_str(raw)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn insert_location(&mut self, location: WorkLocation) {
        self.locations.retain(|existing| existing.id != location.id);
        self.locations.push(location);
    }

    pub fn assign(&mut self, entity: EntityRef, location_id: LocationId) {
        let entry = self.assignments.entry(entity).or_default();
        if !entry.contains(&location_id) {
            entry.push(location_id);
        }
    }

    pub fn set_legacy(&mut self, entity: EntityRef, location_id: LocationId) {
        self.legacy.insert(entity, location_id);
    }
}

impl LocationDirectory for InMemoryLocationDirectory {
    fn location(
        &self,
        id: &LocationId,
    ) -> impl Future<Output = Result<Option<WorkLocation>, DirectoryError>> + Send {
        let found = self
            .locations
            .iter()
            .find(|location| &location.id == id)
            .cloned();
        async move { Ok(found) }
    }

    fn active_locations(
        &self,
    ) -> impl Future<Output = Result<Vec<WorkLocation>, DirectoryError>> + Send {
        let active = self
            .locations
            .iter()
            .filter(|location| location.active)
            .cloned()
            .collect();
        async move { Ok(active) }
    }

    fn assigned_locations(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<Vec<LocationId>, DirectoryError>> + Send {
        let assigned = self.assignments.get(entity).cloned().unwrap_or_default();
        async move { Ok(assigned) }
    }

    fn legacy_location(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<Option<LocationId>, DirectoryError>> + Send {
        let legacy = self.legacy.get(entity).cloned();
        async move { Ok(legacy) }
    }
}
