use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::analysis::{FaceAnalysis, SkinDistribution};
use super::frame::CapturedFrame;
use super::regions::FaceRegionAnalyzer;
use super::thresholds::FaceValidationThresholds;

/// Why a captured frame was rejected. Variants are listed in gate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceRejection {
    Blurred,
    NotClearEnough,
    TooDark,
    TooBright,
    NotCentered,
    MoveCloser,
    NoFaceDetected { random_skin: bool },
    EyesNotVisible,
    EyesNotClear,
    ForeheadNotVisible,
    NoseNotVisible,
    NoseNotClear,
    MouthNotVisible,
    LipsNotVisible,
    MouthNotClear,
    MaskDetected,
    ChinNotVisible,
    HeadwearDetected,
    FullFaceNotDetected,
}

impl FaceRejection {
    pub const fn code(self) -> &'static str {
        match self {
            FaceRejection::Blurred => "blurred",
            FaceRejection::NotClearEnough => "not_clear_enough",
            FaceRejection::TooDark => "too_dark",
            FaceRejection::TooBright => "too_bright",
            FaceRejection::NotCentered => "not_centered",
            FaceRejection::MoveCloser => "move_closer",
            FaceRejection::NoFaceDetected { random_skin: true } => "no_face_random_skin",
            FaceRejection::NoFaceDetected { random_skin: false } => "no_face_detected",
            FaceRejection::EyesNotVisible => "eyes_not_visible",
            FaceRejection::EyesNotClear => "eyes_not_clear",
            FaceRejection::ForeheadNotVisible => "forehead_not_visible",
            FaceRejection::NoseNotVisible => "nose_not_visible",
            FaceRejection::NoseNotClear => "nose_not_clear",
            FaceRejection::MouthNotVisible => "mouth_not_visible",
            FaceRejection::LipsNotVisible => "lips_not_visible",
            FaceRejection::MouthNotClear => "mouth_not_clear",
            FaceRejection::MaskDetected => "mask_detected",
            FaceRejection::ChinNotVisible => "chin_not_visible",
            FaceRejection::HeadwearDetected => "headwear_detected",
            FaceRejection::FullFaceNotDetected => "full_face_not_detected",
        }
    }

    /// User-facing prompt shown with the retake option.
    pub const fn message(self) -> &'static str {
        match self {
            FaceRejection::Blurred => "Photo is blurred. Hold the device steady and retake.",
            FaceRejection::NotClearEnough => "Photo is not clear enough. Clean the lens and retake.",
            FaceRejection::TooDark => "Photo is too dark. Move to a brighter area.",
            FaceRejection::TooBright => "Photo is too bright. Avoid direct light behind or on the camera.",
            FaceRejection::NotCentered => "Face is not centered. Position your face inside the guide.",
            FaceRejection::MoveCloser => "Face is too small. Move closer to the camera.",
            FaceRejection::NoFaceDetected { random_skin: true } => {
                "No face detected. Skin tones were found but do not form a face."
            }
            FaceRejection::NoFaceDetected { random_skin: false } => {
                "No face detected. Look directly at the camera."
            }
            FaceRejection::EyesNotVisible => "Both eyes must be visible. Remove sunglasses or hair covering your eyes.",
            FaceRejection::EyesNotClear => "Eyes are not clear. Open your eyes and hold still.",
            FaceRejection::ForeheadNotVisible => "Forehead must be visible. Move hair or headwear away.",
            FaceRejection::NoseNotVisible => "Nose is not visible. Remove anything covering your face.",
            FaceRejection::NoseNotClear => "Nose is not clear. Hold still and retake.",
            FaceRejection::MouthNotVisible => "Mouth is not visible. Remove anything covering your mouth.",
            FaceRejection::LipsNotVisible => "Lips must be visible.",
            FaceRejection::MouthNotClear => "Mouth is not clear. Hold still and retake.",
            FaceRejection::MaskDetected => "Mask detected. Remove your face mask.",
            FaceRejection::ChinNotVisible => "Chin must be visible. Tilt the camera down slightly.",
            FaceRejection::HeadwearDetected => "Remove headwear (hat, cap, or hood).",
            FaceRejection::FullFaceNotDetected => "Full face not detected. Face the camera directly.",
        }
    }
}

impl fmt::Display for FaceRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for FaceRejection {}

/// Terminal result of one capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error_reason: Option<FaceRejection>,
}

impl ValidationResult {
    pub const fn accepted() -> Self {
        Self {
            valid: true,
            error_reason: None,
        }
    }

    pub const fn rejected(reason: FaceRejection) -> Self {
        Self {
            valid: false,
            error_reason: Some(reason),
        }
    }

    pub fn into_result(self) -> Result<(), FaceRejection> {
        match self.error_reason {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}

/// Validation result together with the analysis that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameValidation {
    pub result: ValidationResult,
    pub analysis: FaceAnalysis,
}

/// Ordered heuristic gates over a [`FaceAnalysis`]; the first failing gate wins.
#[derive(Debug, Clone, Default)]
pub struct FaceValidationPipeline {
    thresholds: FaceValidationThresholds,
    analyzer: FaceRegionAnalyzer,
}

impl FaceValidationPipeline {
    pub fn new(thresholds: FaceValidationThresholds) -> Self {
        Self {
            thresholds,
            analyzer: FaceRegionAnalyzer,
        }
    }

    pub fn thresholds(&self) -> &FaceValidationThresholds {
        &self.thresholds
    }

    pub fn analyze(&self, frame: &CapturedFrame) -> FaceAnalysis {
        FaceAnalysis::from_regions(self.analyzer.analyze(frame), &self.thresholds)
    }

    pub fn validate_frame(&self, frame: &CapturedFrame) -> FrameValidation {
        let analysis = self.analyze(frame);
        let result = self.validate(&analysis);
        FrameValidation { result, analysis }
    }

    pub fn validate(&self, analysis: &FaceAnalysis) -> ValidationResult {
        match self.first_failure(analysis) {
            Some(reason) => {
                debug!(
                    reason = reason.code(),
                    brightness = analysis.brightness,
                    overall_clarity = analysis.overall_clarity,
                    centeredness = analysis.face_centeredness,
                    face_size = analysis.face_size,
                    "face gate rejected frame"
                );
                ValidationResult::rejected(reason)
            }
            None => ValidationResult::accepted(),
        }
    }

    fn first_failure(&self, a: &FaceAnalysis) -> Option<FaceRejection> {
        let t = &self.thresholds;

        if a.is_blurred {
            return Some(FaceRejection::Blurred);
        }
        // Same signal as the blur gate; kept so either message stays reachable.
        if a.overall_clarity < t.min_overall_clarity {
            return Some(FaceRejection::NotClearEnough);
        }
        if a.brightness < t.min_brightness {
            return Some(FaceRejection::TooDark);
        }
        if a.brightness > t.max_brightness {
            return Some(FaceRejection::TooBright);
        }
        if a.face_centeredness < t.min_centeredness {
            return Some(FaceRejection::NotCentered);
        }
        if a.face_size < t.min_face_size {
            return Some(FaceRejection::MoveCloser);
        }
        if !a.has_face_structure(t) {
            return Some(FaceRejection::NoFaceDetected {
                random_skin: a.presence_count() >= t.random_skin_regions,
            });
        }
        if !a.has_left_eye || !a.has_right_eye {
            return Some(FaceRejection::EyesNotVisible);
        }
        if a.eyes_clarity < t.min_eyes_clarity {
            return Some(FaceRejection::EyesNotClear);
        }
        if !a.has_forehead_region {
            return Some(FaceRejection::ForeheadNotVisible);
        }
        if !a.has_nose_region {
            return Some(FaceRejection::NoseNotVisible);
        }
        if a.nose_clarity < t.min_nose_clarity {
            return Some(FaceRejection::NoseNotClear);
        }
        if !a.has_mouth_region {
            return Some(FaceRejection::MouthNotVisible);
        }
        if !a.has_lips {
            return Some(FaceRejection::LipsNotVisible);
        }
        if a.mouth_clarity < t.min_mouth_clarity {
            return Some(FaceRejection::MouthNotClear);
        }
        if a.is_masked {
            return Some(FaceRejection::MaskDetected);
        }
        if !a.has_chin_visible {
            return Some(FaceRejection::ChinNotVisible);
        }
        if a.has_hat {
            return Some(FaceRejection::HeadwearDetected);
        }
        if a.skin_distribution(t) != SkinDistribution::FaceLike {
            return Some(FaceRejection::FullFaceNotDetected);
        }

        None
    }
}
