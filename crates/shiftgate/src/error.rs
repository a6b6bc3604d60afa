use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::clock::{ClockActionError, SinkError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Locations(serde_json::Error),
    Clock(ClockActionError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Locations(err) => write!(f, "invalid work location data: {}", err),
            AppError::Clock(err) => write!(f, "clock action failed ({}): {}", err.code(), err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Locations(err) => Some(err),
            AppError::Clock(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Locations(_) => StatusCode::BAD_REQUEST,
            AppError::Clock(ClockActionError::InvalidTransition(_))
            | AppError::Clock(ClockActionError::SessionInProgress(_))
            | AppError::Clock(ClockActionError::Persistence(SinkError::Conflict { .. })) => {
                StatusCode::CONFLICT
            }
            AppError::Clock(ClockActionError::Persistence(SinkError::WriteFailed(_))) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Clock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Clock(err) => Json(json!({ "error": err.message(), "code": err.code() })),
            other => Json(json!({ "error": other.to_string() })),
        };
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Locations(value)
    }
}

impl From<ClockActionError> for AppError {
    fn from(value: ClockActionError) -> Self {
        Self::Clock(value)
    }
}
