use std::future::Future;
use std::sync::Mutex;

use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;

use crate::workflows::face::{CapturedFrame, FrameError};
use crate::workflows::geofence::GeoPoint;

/// Device position failures, kept distinct so the UI can say which one happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationError {
    #[error("location permission was denied")]
    PermissionDenied,
    #[error("current position is unavailable")]
    PositionUnavailable,
    #[error("timed out waiting for a location fix")]
    Timeout,
    #[error("geolocation is not supported on this device")]
    NotSupported,
}

impl GeolocationError {
    pub const fn code(self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => "permission_denied",
            GeolocationError::PositionUnavailable => "position_unavailable",
            GeolocationError::Timeout => "timeout",
            GeolocationError::NotSupported => "not_supported",
        }
    }
}

/// Source of the device's current position.
pub trait GeolocationProvider: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, GeolocationError>> + Send;
}

/// Provider that always reports the same fix, for fixed kiosks and demos.
#[derive(Debug, Clone, Copy)]
pub struct StaticGeolocation(pub GeoPoint);

impl GeolocationProvider for StaticGeolocation {
    fn current_position(&self) -> impl Future<Output = Result<GeoPoint, GeolocationError>> + Send {
        let position = self.0;
        async move { Ok(position) }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    #[error("camera permission was denied")]
    PermissionDenied,
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("captured frame is malformed: {0}")]
    InvalidFrame(#[from] FrameError),
}

impl CaptureError {
    pub const fn code(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => "camera_permission_denied",
            CaptureError::CameraUnavailable(_) => "camera_unavailable",
            CaptureError::InvalidFrame(_) => "invalid_frame",
        }
    }
}

/// Camera collaborator producing one still per call.
pub trait FrameSource: Send + Sync {
    fn capture(&self) -> impl Future<Output = Result<CapturedFrame, CaptureError>> + Send;
}

/// Local wall-clock used to stamp entries and find the calendar day.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock for demos and tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    pub fn advance(&self, by: Duration) {
        let next = self.now() + by;
        self.set(next);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 31)
            .and_then(|date| date.and_hms_opt(23, 50, 0))
            .expect("valid timestamp");
        let clock = FixedClock::new(start);

        clock.advance(Duration::minutes(15));

        assert_eq!(clock.now().date(), start.date().succ_opt().expect("next day"));
    }

    #[test]
    fn geolocation_codes_are_stable() {
        assert_eq!(GeolocationError::Timeout.code(), "timeout");
        assert_ne!(
            GeolocationError::Timeout.code(),
            GeolocationError::PermissionDenied.code()
        );
    }
}
