//! Work-location geofencing: haversine distance, the three-tier assignment
//! precedence, and the resolver shared by every entity kind.

pub mod directory;
pub mod distance;
pub mod domain;
mod resolver;

pub use directory::{DirectoryError, DirectorySnapshot, InMemoryLocationDirectory, LocationDirectory};
pub use distance::{distance_meters, EARTH_RADIUS_METERS};
pub use domain::{
    AssignmentTier, EntityKind, EntityRef, GeoPoint, GeofenceMatch, GeofenceViolation, LocationId,
    WorkLocation,
};
pub use resolver::GeofenceResolver;
