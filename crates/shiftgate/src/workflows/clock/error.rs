use serde::Serialize;

use super::providers::{CaptureError, GeolocationError};
use super::sink::SinkError;
use crate::workflows::attendance::InvalidTransition;
use crate::workflows::face::FaceRejection;
use crate::workflows::geofence::{EntityRef, GeofenceViolation};

/// Step (2) failure: either no usable position or a position outside every candidate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeofenceFailure {
    #[error(transparent)]
    Position(#[from] GeolocationError),
    #[error(transparent)]
    Violation(#[from] GeofenceViolation),
}

impl GeofenceFailure {
    pub const fn code(&self) -> &'static str {
        match self {
            GeofenceFailure::Position(error) => error.code(),
            GeofenceFailure::Violation(violation) => violation.code(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClockActionError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("a clock action is already in progress for {0}")]
    SessionInProgress(EntityRef),
    #[error(transparent)]
    Geofence(#[from] GeofenceFailure),
    #[error(transparent)]
    Face(#[from] FaceRejection),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Persistence(#[from] SinkError),
    #[error("clock action was cancelled")]
    Cancelled,
    #[error("{requested} is not available while the session is {stage}")]
    OutOfSequence {
        requested: &'static str,
        stage: &'static str,
    },
}

impl ClockActionError {
    pub fn code(&self) -> &'static str {
        match self {
            ClockActionError::InvalidTransition(_) => "invalid_transition",
            ClockActionError::SessionInProgress(_) => "session_in_progress",
            ClockActionError::Geofence(failure) => failure.code(),
            ClockActionError::Face(rejection) => rejection.code(),
            ClockActionError::Capture(error) => error.code(),
            ClockActionError::Persistence(error) => error.code(),
            ClockActionError::Cancelled => "cancelled",
            ClockActionError::OutOfSequence { .. } => "out_of_sequence",
        }
    }

    /// Step at which the action stopped, for user-facing grouping.
    pub fn step(&self) -> ClockStep {
        match self {
            ClockActionError::InvalidTransition(_) | ClockActionError::SessionInProgress(_) => {
                ClockStep::Transition
            }
            ClockActionError::Geofence(_) => ClockStep::Geofence,
            ClockActionError::Face(_) | ClockActionError::Capture(_) => ClockStep::Photo,
            ClockActionError::Persistence(_) => ClockStep::Commit,
            ClockActionError::Cancelled | ClockActionError::OutOfSequence { .. } => {
                ClockStep::Session
            }
        }
    }

    /// User-facing text; face rejections reuse their guidance messages.
    pub fn message(&self) -> String {
        match self {
            ClockActionError::Face(rejection) => rejection.message().to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockStep {
    Transition,
    Geofence,
    Photo,
    Commit,
    Session,
}
