//! Heuristic face-presence check: fixed-region pixel statistics feeding an
//! ordered, fail-fast gate pipeline.

mod analysis;
pub mod frame;
mod pipeline;
pub mod regions;
pub mod sample;
mod thresholds;

#[cfg(test)]
mod tests;

pub use analysis::{FaceAnalysis, SkinDistribution};
pub use frame::{CapturedFrame, FrameError};
pub use pipeline::{FaceRejection, FaceValidationPipeline, FrameValidation, ValidationResult};
pub use regions::{FaceRegion, FaceRegionAnalyzer, RegionSet, RegionStats};
pub use thresholds::FaceValidationThresholds;
