use std::fmt;

use serde::{Deserialize, Serialize};

/// WGS-84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Identifier wrapper for configured work locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub String);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authorized work site owned by the configuration collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLocation {
    pub id: LocationId,
    pub name: String,
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub active: bool,
}

/// Which assignment table an entity's locations are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Worker,
    Employee,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Worker => "worker",
            EntityKind::Employee => "employee",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "worker" | "workers" => Some(Self::Worker),
            "employee" | "employees" => Some(Self::Employee),
            _ => None,
        }
    }
}

/// Entity whose location assignments and attendance are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn worker(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Worker,
            id: id.into(),
        }
    }

    pub fn employee(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Employee,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.label(), self.id)
    }
}

/// Precedence tier that supplied the candidate locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentTier {
    Explicit,
    Legacy,
    AnyActive,
}

/// Successful geofence resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofenceMatch {
    pub location_id: LocationId,
    pub location_name: String,
    pub distance_meters: f64,
    pub radius_meters: f64,
    pub tier: AssignmentTier,
}

/// Reasons a position fails the geofence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeofenceViolation {
    #[error("no active work locations are configured")]
    NoLocationsConfigured,
    #[error("assigned work location {} was not found or is inactive", .0.as_ref().map(|id| id.0.as_str()).unwrap_or("(any)"))]
    LocationNotFoundOrInactive(Option<LocationId>),
    #[error("{distance_meters:.0}m from {location_name}; must be within {required_radius_meters:.0}m")]
    OutOfRadius {
        location_name: String,
        distance_meters: f64,
        required_radius_meters: f64,
    },
    #[error("device position is not a finite coordinate")]
    InvalidPosition,
    #[error("location directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

impl GeofenceViolation {
    pub const fn code(&self) -> &'static str {
        match self {
            GeofenceViolation::NoLocationsConfigured => "no_locations_configured",
            GeofenceViolation::LocationNotFoundOrInactive(_) => "location_not_found_or_inactive",
            GeofenceViolation::OutOfRadius { .. } => "out_of_radius",
            GeofenceViolation::InvalidPosition => "invalid_position",
            GeofenceViolation::DirectoryUnavailable(_) => "directory_unavailable",
        }
    }

    /// Transient failures may succeed on a plain retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, GeofenceViolation::DirectoryUnavailable(_))
    }
}
