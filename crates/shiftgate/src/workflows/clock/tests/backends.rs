use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::common::*;
use crate::workflows::attendance::EntryType;
use crate::workflows::clock::{
    ClockActionError, ClockActionOrchestrator, FixedClock, InMemoryAttendanceSink,
};
use crate::workflows::face::FaceValidationPipeline;
use crate::workflows::geofence::{
    DirectoryError, EntityRef, InMemoryLocationDirectory, LocationDirectory, LocationId,
    WorkLocation,
};

const LOOKUP_DELAY: Duration = Duration::from_millis(300);

/// Directory whose active-location listing waits like a remote query.
struct SlowDirectory {
    inner: InMemoryLocationDirectory,
}

impl LocationDirectory for SlowDirectory {
    async fn location(&self, id: &LocationId) -> Result<Option<WorkLocation>, DirectoryError> {
        self.inner.location(id).await
    }

    async fn active_locations(&self) -> Result<Vec<WorkLocation>, DirectoryError> {
        tokio::time::sleep(LOOKUP_DELAY).await;
        self.inner.active_locations().await
    }

    async fn assigned_locations(
        &self,
        entity: &EntityRef,
    ) -> Result<Vec<LocationId>, DirectoryError> {
        self.inner.assigned_locations(entity).await
    }

    async fn legacy_location(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<LocationId>, DirectoryError> {
        self.inner.legacy_location(entity).await
    }
}

type SlowOrchestrator = ClockActionOrchestrator<
    SlowDirectory,
    ScriptedGeolocation,
    ScriptedCamera,
    InMemoryAttendanceSink,
    FixedClock,
>;

fn slow_orchestrator(sink: Arc<InMemoryAttendanceSink>) -> SlowOrchestrator {
    ClockActionOrchestrator::new(
        Arc::new(SlowDirectory { inner: directory() }),
        Arc::new(ScriptedGeolocation::new(vec![GeoStep::Fix(NEAR_SITE)])),
        Arc::new(ScriptedCamera::new(vec![CameraStep::Frame(face())])),
        sink,
        Arc::new(FixedClock::new(morning())),
        FaceValidationPipeline::default(),
    )
}

#[tokio::test]
async fn slow_directory_does_not_stall_other_tasks() {
    let sink = Arc::new(InMemoryAttendanceSink::new());
    let orchestrator = slow_orchestrator(Arc::clone(&sink));

    let heartbeat = tokio::spawn(async {
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        started.elapsed()
    });

    let mut session = orchestrator
        .begin(worker(), EntryType::ClockIn)
        .await
        .expect("clock in allowed");
    session.run().await.expect("clock in recorded");

    let waited = heartbeat.await.expect("heartbeat joined");
    assert!(waited < Duration::from_millis(150), "heartbeat took {waited:?}");
    assert_eq!(sink.entries(&worker()).len(), 1);
}

#[tokio::test]
async fn cancel_interrupts_a_slow_directory_lookup() {
    let sink = Arc::new(InMemoryAttendanceSink::new());
    let orchestrator = slow_orchestrator(Arc::clone(&sink));
    let mut session = orchestrator
        .begin(worker(), EntryType::ClockIn)
        .await
        .expect("clock in allowed");
    let cancel = session.cancel_handle();

    let started = Instant::now();
    let task = tokio::spawn(async move { session.run().await.map(|_| ()) });
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let outcome = task.await.expect("task joined");
    assert!(matches!(outcome, Err(ClockActionError::Cancelled)));
    assert!(started.elapsed() < LOOKUP_DELAY);
    assert!(sink.entries(&worker()).is_empty());
    assert_eq!(orchestrator.sessions_in_flight(), 0);
}
