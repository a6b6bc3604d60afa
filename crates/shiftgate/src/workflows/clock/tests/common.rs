use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Notify;

use crate::workflows::clock::{
    CaptureError, ClockActionOrchestrator, FixedClock, FrameSource, GeolocationError,
    GeolocationProvider, InMemoryAttendanceSink,
};
use crate::workflows::face::{sample, CapturedFrame, FaceValidationPipeline};
use crate::workflows::geofence::{
    EntityRef, GeoPoint, InMemoryLocationDirectory, LocationId, WorkLocation,
};

pub(super) const SITE: GeoPoint = GeoPoint::new(14.5995, 120.9842);
/// ~11 m east of [`SITE`].
pub(super) const NEAR_SITE: GeoPoint = GeoPoint::new(14.5995, 120.9843);
/// ~200 m north of [`SITE`].
pub(super) const FAR_FROM_SITE: GeoPoint = GeoPoint::new(14.6013, 120.9842);

pub(super) type TestOrchestrator = ClockActionOrchestrator<
    InMemoryLocationDirectory,
    ScriptedGeolocation,
    ScriptedCamera,
    InMemoryAttendanceSink,
    FixedClock,
>;

pub(super) fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 12)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .expect("valid timestamp")
}

pub(super) fn worker() -> EntityRef {
    EntityRef::worker("w-100")
}

pub(super) fn face() -> CapturedFrame {
    sample::face_frame(200).expect("frame")
}

pub(super) fn masked_face() -> CapturedFrame {
    sample::SampleFrame::wall(200)
        .expect("frame")
        .face()
        .masked()
        .build()
}

pub(super) enum GeoStep {
    Fix(GeoPoint),
    Fail(GeolocationError),
    Hang,
    /// Resolves with the point once the gate is notified.
    Gated(Arc<Notify>, GeoPoint),
}

#[derive(Default)]
pub(super) struct ScriptedGeolocation {
    steps: Mutex<VecDeque<GeoStep>>,
}

impl ScriptedGeolocation {
    pub(super) fn new(steps: impl IntoIterator<Item = GeoStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
        }
    }
}

impl GeolocationProvider for ScriptedGeolocation {
    fn current_position(
        &self,
    ) -> impl Future<Output = Result<GeoPoint, GeolocationError>> + Send {
        let step = self.steps.lock().expect("geo script").pop_front();
        async move {
            match step {
                Some(GeoStep::Fix(point)) => Ok(point),
                Some(GeoStep::Fail(error)) => Err(error),
                Some(GeoStep::Hang) => std::future::pending().await,
                Some(GeoStep::Gated(gate, point)) => {
                    gate.notified().await;
                    Ok(point)
                }
                None => Err(GeolocationError::PositionUnavailable),
            }
        }
    }
}

pub(super) enum CameraStep {
    Frame(CapturedFrame),
    Fail(CaptureError),
    Gated(Arc<Notify>, CapturedFrame),
}

#[derive(Default)]
pub(super) struct ScriptedCamera {
    steps: Mutex<VecDeque<CameraStep>>,
    captures: AtomicUsize,
}

impl ScriptedCamera {
    pub(super) fn new(steps: impl IntoIterator<Item = CameraStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            captures: AtomicUsize::new(0),
        }
    }

    pub(super) fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl FrameSource for ScriptedCamera {
    fn capture(&self) -> impl Future<Output = Result<CapturedFrame, CaptureError>> + Send {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().expect("camera script").pop_front();
        async move {
            match step {
                Some(CameraStep::Frame(frame)) => Ok(frame),
                Some(CameraStep::Fail(error)) => Err(error),
                Some(CameraStep::Gated(gate, frame)) => {
                    gate.notified().await;
                    Ok(frame)
                }
                None => Err(CaptureError::CameraUnavailable("script exhausted".to_string())),
            }
        }
    }
}

pub(super) struct Harness {
    pub(super) orchestrator: TestOrchestrator,
    pub(super) sink: Arc<InMemoryAttendanceSink>,
    pub(super) camera: Arc<ScriptedCamera>,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn directory() -> InMemoryLocationDirectory {
    InMemoryLocationDirectory::new(vec![WorkLocation {
        id: LocationId("site-a".to_string()),
        name: "Site A".to_string(),
        center: SITE,
        radius_meters: 50.0,
        active: true,
    }])
}

pub(super) fn harness(geo: Vec<GeoStep>, camera: Vec<CameraStep>) -> Harness {
    let sink = Arc::new(InMemoryAttendanceSink::new());
    let camera = Arc::new(ScriptedCamera::new(camera));
    let clock = Arc::new(FixedClock::new(morning()));
    let orchestrator = ClockActionOrchestrator::new(
        Arc::new(directory()),
        Arc::new(ScriptedGeolocation::new(geo)),
        Arc::clone(&camera),
        Arc::clone(&sink),
        Arc::clone(&clock),
        FaceValidationPipeline::default(),
    )
    .with_geolocation_timeout(Duration::from_millis(50));

    Harness {
        orchestrator,
        sink,
        camera,
        clock,
    }
}
