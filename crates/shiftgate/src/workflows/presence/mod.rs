//! HTTP surface for the pure presence checks and today's shift status.

pub mod router;
mod service;

#[cfg(test)]
mod tests;

pub use router::{presence_router, FrameRequest};
pub use service::{DistanceRequest, GeofenceCheckRequest, PresenceService, ShiftStatusView};
