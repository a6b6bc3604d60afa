use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::workflows::attendance::{EntryType, ShiftState, TimeEntry};
use crate::workflows::clock::{AttendanceSink, Clock, ClockActionError};
use crate::workflows::face::{CapturedFrame, FaceValidationPipeline, FrameValidation};
use crate::workflows::geofence::{
    distance_meters, EntityKind, EntityRef, GeoPoint, GeofenceMatch, GeofenceResolver,
    GeofenceViolation, LocationDirectory,
};

/// Stateless presence checks plus a read-only view of today's attendance.
pub struct PresenceService<D, S, C> {
    resolver: GeofenceResolver<D>,
    pipeline: Arc<FaceValidationPipeline>,
    sink: Arc<S>,
    clock: Arc<C>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeofenceCheckRequest {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeofenceCheckRequest {
    pub fn entity(&self) -> EntityRef {
        EntityRef {
            kind: self.entity_kind,
            id: self.entity_id.clone(),
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistanceRequest {
    pub from: GeoPoint,
    pub to: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftStatusView {
    pub entity: EntityRef,
    pub state: ShiftState,
    pub legal_actions: Vec<EntryType>,
    pub last_entry: Option<TimeEntry>,
}

impl<D, S, C> PresenceService<D, S, C>
where
    D: LocationDirectory + 'static,
    S: AttendanceSink + 'static,
    C: Clock + 'static,
{
    pub fn new(
        directory: Arc<D>,
        sink: Arc<S>,
        clock: Arc<C>,
        pipeline: FaceValidationPipeline,
    ) -> Self {
        Self {
            resolver: GeofenceResolver::new(directory),
            pipeline: Arc::new(pipeline),
            sink,
            clock,
        }
    }

    pub async fn check_geofence(
        &self,
        request: &GeofenceCheckRequest,
    ) -> Result<GeofenceMatch, GeofenceViolation> {
        self.resolver
            .resolve(&request.entity(), request.position())
            .await
    }

    pub fn validate_face(&self, frame: &CapturedFrame) -> FrameValidation {
        self.pipeline.validate_frame(frame)
    }

    pub fn distance(&self, request: &DistanceRequest) -> f64 {
        distance_meters(request.from, request.to)
    }

    pub async fn shift_status(
        &self,
        entity: EntityRef,
    ) -> Result<ShiftStatusView, ClockActionError> {
        let today = self.clock.now().date();
        let mut entries = self.sink.entries_for_day(&entity, today).await?;
        entries.sort_by_key(|entry| entry.timestamp);
        let state = ShiftState::for_day(&entries, today);

        Ok(ShiftStatusView {
            entity,
            state,
            legal_actions: state.legal_actions().to_vec(),
            last_entry: entries.pop(),
        })
    }

    /// Whether `entry_type` is legal right now, and the state it would lead to.
    /// Nothing is claimed or written.
    pub async fn check_action(
        &self,
        entity: &EntityRef,
        entry_type: EntryType,
    ) -> Result<ShiftState, ClockActionError> {
        let today = self.clock.now().date();
        let entries = self.sink.entries_for_day(entity, today).await?;
        Ok(ShiftState::for_day(&entries, today).apply(entry_type)?)
    }
}
