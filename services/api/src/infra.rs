use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use shiftgate::error::AppError;
use shiftgate::workflows::clock::{
    CaptureError, FrameSource, GeolocationError, GeolocationProvider,
};
use shiftgate::workflows::face::{sample, CapturedFrame};
use shiftgate::workflows::geofence::{
    GeoPoint, InMemoryLocationDirectory, LocationId, WorkLocation,
};

pub(crate) const SAMPLE_FRAME_SIZE: u32 = 200;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Single active site used when no locations file is supplied.
pub(crate) fn sample_site() -> WorkLocation {
    WorkLocation {
        id: LocationId("main-depot".to_string()),
        name: "Main Depot".to_string(),
        center: GeoPoint::new(14.5995, 120.9842),
        radius_meters: 50.0,
        active: true,
    }
}

pub(crate) fn load_directory(path: Option<&Path>) -> Result<InMemoryLocationDirectory, AppError> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(InMemoryLocationDirectory::from_json(&raw)?)
        }
        None => Ok(InMemoryLocationDirectory::new(vec![sample_site()])),
    }
}

/// Replays queued fixes, then keeps reporting the fallback position.
pub(crate) struct ReplayGeolocation {
    fixes: Mutex<VecDeque<GeoPoint>>,
    fallback: GeoPoint,
}

impl ReplayGeolocation {
    pub(crate) fn new(fixes: impl IntoIterator<Item = GeoPoint>, fallback: GeoPoint) -> Self {
        Self {
            fixes: Mutex::new(fixes.into_iter().collect()),
            fallback,
        }
    }
}

impl GeolocationProvider for ReplayGeolocation {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, GeolocationError>> + Send {
        let next = match self.fixes.lock() {
            Ok(mut fixes) => Ok(fixes.pop_front().unwrap_or(self.fallback)),
            Err(_) => Err(GeolocationError::PositionUnavailable),
        };
        async move { next }
    }
}

/// Replays queued frames, then keeps producing a well-framed sample face.
#[derive(Default)]
pub(crate) struct ReplayCamera {
    frames: Mutex<VecDeque<CapturedFrame>>,
}

impl ReplayCamera {
    pub(crate) fn new(frames: impl IntoIterator<Item = CapturedFrame>) -> Self {
        Self {
            frames: Mutex::new(frames.into_iter().collect()),
        }
    }

    fn next_frame(&self) -> Result<CapturedFrame, CaptureError> {
        let queued = self
            .frames
            .lock()
            .map_err(|_| CaptureError::CameraUnavailable("frame queue poisoned".to_string()))?
            .pop_front();
        match queued {
            Some(frame) => Ok(frame),
            None => Ok(sample::face_frame(SAMPLE_FRAME_SIZE)?),
        }
    }
}

impl FrameSource for ReplayCamera {
    fn capture(&self) -> impl Future<Output = Result<CapturedFrame, CaptureError>> + Send {
        let frame = self.next_frame();
        async move { frame }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
