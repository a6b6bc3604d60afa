use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::face::FaceValidationThresholds;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the attendance service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub clock: ClockConfig,
    pub face: FaceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let raw_timeout =
            env::var("GEOLOCATION_TIMEOUT_SECS").unwrap_or_else(|_| "15".to_string());
        let geolocation_timeout = match raw_timeout.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => return Err(ConfigError::InvalidTimeout { value: raw_timeout }),
        };

        let thresholds_path = env::var("FACE_THRESHOLDS_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            clock: ClockConfig {
                geolocation_timeout,
            },
            face: FaceConfig { thresholds_path },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Clock-action timing.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    pub geolocation_timeout: Duration,
}

/// Face-check tuning; built-in thresholds apply when no override file is set.
#[derive(Debug, Clone, Default)]
pub struct FaceConfig {
    pub thresholds_path: Option<PathBuf>,
}

impl FaceConfig {
    pub fn thresholds(&self) -> Result<FaceValidationThresholds, ConfigError> {
        let Some(path) = &self.thresholds_path else {
            return Ok(FaceValidationThresholds::default());
        };

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Thresholds {
            path: path.clone(),
            source: ThresholdsSource::Io(source),
        })?;
        FaceValidationThresholds::from_json(&raw).map_err(|source| ConfigError::Thresholds {
            path: path.clone(),
            source: ThresholdsSource::Json(source),
        })
    }
}

#[derive(Debug)]
pub enum ThresholdsSource {
    Io(std::io::Error),
    Json(serde_json::Error),
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout { value: String },
    Thresholds { path: PathBuf, source: ThresholdsSource },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "GEOLOCATION_TIMEOUT_SECS must be a positive whole number of seconds (got '{value}')"
            ),
            ConfigError::Thresholds { path, source } => {
                let reason = match source {
                    ThresholdsSource::Io(_) => "could not be read",
                    ThresholdsSource::Json(_) => "is not valid thresholds JSON",
                };
                write!(f, "FACE_THRESHOLDS_PATH {} {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidTimeout { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Thresholds { source, .. } => match source {
                ThresholdsSource::Io(err) => Some(err),
                ThresholdsSource::Json(err) => Some(err),
            },
        }
    }
}
