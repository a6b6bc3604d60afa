pub mod attendance;
pub mod clock;
pub mod face;
pub mod geofence;
pub mod presence;

pub use presence::{presence_router, PresenceService};
