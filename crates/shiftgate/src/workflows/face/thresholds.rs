use serde::{Deserialize, Serialize};

/// Every numeric constant used to derive and gate a [`super::FaceAnalysis`].
///
/// Loaded from JSON with per-field defaults, so partial overrides are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceValidationThresholds {
    pub min_overall_clarity: f64,
    pub min_eyes_clarity: f64,
    pub min_nose_clarity: f64,
    pub min_mouth_clarity: f64,

    pub min_brightness: f64,
    pub max_brightness: f64,

    pub min_centeredness: f64,
    /// Skin-centroid offset (fraction of the frame) at which centeredness reaches zero.
    pub centering_tolerance: f64,

    pub min_face_size: f64,
    /// Center-region skin ratio treated as a fully framed face.
    pub full_face_skin_ratio: f64,

    pub min_face_regions: usize,
    pub random_skin_regions: usize,

    pub forehead_skin_ratio: f64,
    pub eye_skin_ratio: f64,
    pub eye_min_variance: f64,
    pub nose_skin_ratio: f64,
    pub mouth_skin_ratio: f64,
    pub lips_skin_ratio: f64,
    pub chin_skin_ratio: f64,
    pub cheek_skin_ratio: f64,

    pub mask_lower_skin_max: f64,
    pub mask_upper_skin_min: f64,
    pub mask_max_variance: f64,

    pub hat_dark_ratio: f64,
    pub hat_max_variance: f64,

    pub max_cheek_skin_delta: f64,
    pub max_eye_variance_delta: f64,
}

impl Default for FaceValidationThresholds {
    fn default() -> Self {
        Self {
            min_overall_clarity: 18.0,
            min_eyes_clarity: 15.0,
            min_nose_clarity: 18.0,
            min_mouth_clarity: 16.0,
            min_brightness: 50.0,
            max_brightness: 220.0,
            min_centeredness: 0.20,
            centering_tolerance: 0.15,
            min_face_size: 0.55,
            full_face_skin_ratio: 0.30,
            min_face_regions: 4,
            random_skin_regions: 2,
            forehead_skin_ratio: 0.30,
            eye_skin_ratio: 0.15,
            eye_min_variance: 250.0,
            nose_skin_ratio: 0.30,
            mouth_skin_ratio: 0.25,
            lips_skin_ratio: 0.20,
            chin_skin_ratio: 0.30,
            cheek_skin_ratio: 0.30,
            mask_lower_skin_max: 0.25,
            mask_upper_skin_min: 0.40,
            mask_max_variance: 600.0,
            hat_dark_ratio: 0.60,
            hat_max_variance: 600.0,
            max_cheek_skin_delta: 0.35,
            max_eye_variance_delta: 1200.0,
        }
    }
}

impl FaceValidationThresholds {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
