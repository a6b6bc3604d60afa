use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::{ClockActionError, GeofenceFailure};
use super::providers::{Clock, FrameSource, GeolocationError, GeolocationProvider};
use super::session::{CancelHandle, RecordedEntry, SessionRegistry, SessionStage};
use super::sink::{AttendanceSink, AttendanceWrite};
use crate::workflows::attendance::{
    derive_timesheet, last_entry_on, EntryType, PhotoRef, ShiftState, TimeEntry,
};
use crate::workflows::face::FaceValidationPipeline;
use crate::workflows::geofence::{EntityRef, GeofenceMatch, GeofenceResolver, LocationDirectory};

pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Sequences transition check, geofence, photo validation and the attendance write.
pub struct ClockActionOrchestrator<D, G, F, S, C> {
    resolver: GeofenceResolver<D>,
    geolocation: Arc<G>,
    camera: Arc<F>,
    sink: Arc<S>,
    clock: Arc<C>,
    pipeline: Arc<FaceValidationPipeline>,
    geolocation_timeout: Duration,
    sessions: SessionRegistry,
}

impl<D, G, F, S, C> Clone for ClockActionOrchestrator<D, G, F, S, C> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            geolocation: Arc::clone(&self.geolocation),
            camera: Arc::clone(&self.camera),
            sink: Arc::clone(&self.sink),
            clock: Arc::clone(&self.clock),
            pipeline: Arc::clone(&self.pipeline),
            geolocation_timeout: self.geolocation_timeout,
            sessions: self.sessions.clone(),
        }
    }
}

impl<D, G, F, S, C> ClockActionOrchestrator<D, G, F, S, C>
where
    D: LocationDirectory,
    G: GeolocationProvider,
    F: FrameSource,
    S: AttendanceSink,
    C: Clock,
{
    pub fn new(
        directory: Arc<D>,
        geolocation: Arc<G>,
        camera: Arc<F>,
        sink: Arc<S>,
        clock: Arc<C>,
        pipeline: FaceValidationPipeline,
    ) -> Self {
        Self {
            resolver: GeofenceResolver::new(directory),
            geolocation,
            camera,
            sink,
            clock,
            pipeline: Arc::new(pipeline),
            geolocation_timeout: DEFAULT_GEOLOCATION_TIMEOUT,
            sessions: SessionRegistry::default(),
        }
    }

    pub fn with_geolocation_timeout(mut self, timeout: Duration) -> Self {
        self.geolocation_timeout = timeout;
        self
    }

    pub fn geolocation_timeout(&self) -> Duration {
        self.geolocation_timeout
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of entities with a session currently in flight.
    pub fn sessions_in_flight(&self) -> usize {
        self.sessions.in_flight()
    }

    /// Shift state for the current local day.
    pub async fn current_state(&self, entity: &EntityRef) -> Result<ShiftState, ClockActionError> {
        let today = self.clock.now().date();
        let entries = self.sink.entries_for_day(entity, today).await?;
        Ok(ShiftState::for_day(&entries, today))
    }

    /// Step (1): validates the transition and claims the entity's in-flight slot.
    pub async fn begin(
        &self,
        entity: EntityRef,
        entry_type: EntryType,
    ) -> Result<ClockSession<D, G, F, S, C>, ClockActionError> {
        let today = self.clock.now().date();
        let entries = self.sink.entries_for_day(&entity, today).await?;
        let expected_last = last_entry_on(&entries, today);
        let next_state = ShiftState::from_last(expected_last).apply(entry_type)?;

        let generation = self.sessions.claim(&entity)?;
        debug!(%entity, action = entry_type.code(), generation, "clock session started");

        let handle = CancelHandle::new(self.sessions.clone(), entity.clone(), generation);
        Ok(ClockSession {
            orchestrator: self.clone(),
            cancel_rx: handle.subscribe(),
            handle,
            entity,
            entry_type,
            expected_last,
            next_state,
            stage: SessionStage::Locating,
            location: None,
        })
    }
}

/// One attempt at recording a single entry for a single entity.
///
/// The session holds the entity's in-flight slot until it commits, is cancelled
/// or is dropped. Every step after an await re-checks that the session is still
/// current, so a late position fix or photo never produces a write.
pub struct ClockSession<D, G, F, S, C> {
    orchestrator: ClockActionOrchestrator<D, G, F, S, C>,
    handle: CancelHandle,
    cancel_rx: watch::Receiver<bool>,
    entity: EntityRef,
    entry_type: EntryType,
    expected_last: Option<EntryType>,
    next_state: ShiftState,
    stage: SessionStage,
    location: Option<GeofenceMatch>,
}

impl<D, G, F, S, C> ClockSession<D, G, F, S, C>
where
    D: LocationDirectory,
    G: GeolocationProvider,
    F: FrameSource,
    S: AttendanceSink,
    C: Clock,
{
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    /// Location matched in step (2), once the geofence has passed.
    pub fn location(&self) -> Option<&GeofenceMatch> {
        self.location.as_ref()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    pub fn cancel(&mut self) {
        self.handle.cancel();
        self.stage = SessionStage::Cancelled;
    }

    /// Runs every remaining step from the current stage.
    pub async fn run(&mut self) -> Result<RecordedEntry, ClockActionError> {
        match self.stage {
            SessionStage::Locating => {
                self.check_geofence().await?;
                self.capture_and_commit().await
            }
            SessionStage::Capturing => self.capture_and_commit().await,
            stage => Err(self.out_of_sequence("run", stage)),
        }
    }

    /// Re-runs from step (2); only valid while the geofence has not passed.
    pub async fn retry_location(&mut self) -> Result<RecordedEntry, ClockActionError> {
        match self.stage {
            SessionStage::Locating => self.run().await,
            stage => Err(self.out_of_sequence("retry_location", stage)),
        }
    }

    /// Discards the rejected photo and re-runs from step (3).
    pub async fn retake(&mut self) -> Result<RecordedEntry, ClockActionError> {
        match self.stage {
            SessionStage::Capturing => self.capture_and_commit().await,
            stage => Err(self.out_of_sequence("retake", stage)),
        }
    }

    async fn check_geofence(&mut self) -> Result<(), ClockActionError> {
        let timeout = self.orchestrator.geolocation_timeout;
        let fix = tokio::time::timeout(timeout, self.orchestrator.geolocation.current_position());
        let position = match self.until_cancelled(fix).await? {
            Ok(Ok(position)) => position,
            Ok(Err(error)) => return Err(self.geofence_failed(error.into())),
            Err(_elapsed) => return Err(self.geofence_failed(GeolocationError::Timeout.into())),
        };
        self.ensure_current()?;

        let resolved = self
            .until_cancelled(self.orchestrator.resolver.resolve(&self.entity, position))
            .await?;
        self.ensure_current()?;
        let matched = resolved.map_err(|violation| self.geofence_failed(violation.into()))?;

        debug!(
            entity = %self.entity,
            location = %matched.location_id,
            distance_meters = matched.distance_meters,
            "geofence passed"
        );
        self.location = Some(matched);
        self.stage = SessionStage::Capturing;
        Ok(())
    }

    async fn capture_and_commit(&mut self) -> Result<RecordedEntry, ClockActionError> {
        let captured = self
            .until_cancelled(self.orchestrator.camera.capture())
            .await?;
        self.ensure_current()?;
        let frame = captured.map_err(|error| {
            warn!(entity = %self.entity, reason = error.code(), "photo capture failed");
            ClockActionError::from(error)
        })?;

        let verdict = self.orchestrator.pipeline.validate_frame(&frame);
        if let Err(rejection) = verdict.result.into_result() {
            warn!(
                entity = %self.entity,
                action = self.entry_type.code(),
                reason = rejection.code(),
                "photo rejected"
            );
            return Err(rejection.into());
        }

        self.commit().await
    }

    async fn commit(&mut self) -> Result<RecordedEntry, ClockActionError> {
        self.ensure_current()?;
        let location = match self.location.clone() {
            Some(location) => location,
            None => return Err(self.out_of_sequence("commit", self.stage)),
        };

        let timestamp = self.orchestrator.clock.now();
        let day_entries = self
            .until_cancelled(
                self.orchestrator
                    .sink
                    .entries_for_day(&self.entity, timestamp.date()),
            )
            .await??;
        self.ensure_current()?;
        let timesheet = derive_timesheet(&self.entity, self.entry_type, timestamp, &day_entries);
        let write = AttendanceWrite {
            entry: TimeEntry {
                entity: self.entity.clone(),
                entry_type: self.entry_type,
                timestamp,
                photo: PhotoRef::for_entry(&self.entity, self.entry_type, timestamp),
            },
            expected_last: self.expected_last,
            timesheet: timesheet.clone(),
        };

        // The write itself is not raced against cancel: once sent it either lands or fails.
        let entry = self.orchestrator.sink.commit(write).await.map_err(|error| {
            warn!(entity = %self.entity, reason = error.code(), "attendance write failed");
            ClockActionError::from(error)
        })?;

        info!(
            entity = %entry.entity,
            action = entry.entry_type.code(),
            location = %location.location_id,
            timestamp = %entry.timestamp,
            "attendance entry recorded"
        );
        self.stage = SessionStage::Committed;
        self.handle.release();

        Ok(RecordedEntry {
            entry,
            location,
            timesheet,
            state: self.next_state,
        })
    }

    /// Races `work` against cancellation; cancellation wins ties.
    async fn until_cancelled<T>(
        &self,
        work: impl Future<Output = T>,
    ) -> Result<T, ClockActionError> {
        self.ensure_current()?;
        tokio::select! {
            biased;
            _ = cancelled(self.cancel_rx.clone()) => Err(ClockActionError::Cancelled),
            value = work => Ok(value),
        }
    }

    fn ensure_current(&self) -> Result<(), ClockActionError> {
        if self.stage == SessionStage::Cancelled || self.handle.is_cancelled() {
            return Err(ClockActionError::Cancelled);
        }
        Ok(())
    }

    fn geofence_failed(&self, failure: GeofenceFailure) -> ClockActionError {
        warn!(
            entity = %self.entity,
            action = self.entry_type.code(),
            reason = failure.code(),
            "geofence check failed"
        );
        ClockActionError::Geofence(failure)
    }

    fn out_of_sequence(&self, requested: &'static str, stage: SessionStage) -> ClockActionError {
        if stage == SessionStage::Cancelled {
            return ClockActionError::Cancelled;
        }
        ClockActionError::OutOfSequence {
            requested,
            stage: stage.label(),
        }
    }
}

/// Resolves once the session's cancel flag is raised or its sender is gone.
async fn cancelled(mut signal: watch::Receiver<bool>) {
    loop {
        let raised = *signal.borrow_and_update();
        if raised || signal.changed().await.is_err() {
            return;
        }
    }
}

impl<D, G, F, S, C> Drop for ClockSession<D, G, F, S, C> {
    fn drop(&mut self) {
        self.handle.release();
    }
}
