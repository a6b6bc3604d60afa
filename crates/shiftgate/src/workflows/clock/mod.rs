//! Clock-action orchestration: one session walks an entity through the
//! transition check, geofence, photo validation and the attendance write.

pub mod error;
mod orchestrator;
pub mod providers;
mod session;
pub mod sink;

#[cfg(test)]
mod tests;

pub use error::{ClockActionError, ClockStep, GeofenceFailure};
pub use orchestrator::{ClockActionOrchestrator, ClockSession, DEFAULT_GEOLOCATION_TIMEOUT};
pub use providers::{
    CaptureError, Clock, FixedClock, FrameSource, GeolocationError, GeolocationProvider,
    StaticGeolocation, SystemClock,
};
pub use session::{CancelHandle, RecordedEntry, SessionStage};
pub use sink::{AttendanceSink, AttendanceWrite, InMemoryAttendanceSink, SinkError};
