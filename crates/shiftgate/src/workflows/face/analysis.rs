use serde::{Deserialize, Serialize};

use super::regions::{FaceRegion, RegionSet, RegionStats};
use super::thresholds::FaceValidationThresholds;

/// Derived facial signals for one frame.
///
/// Built from pixel statistics by [`FaceAnalysis::from_regions`]; tests may also
/// construct it directly to exercise individual gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceAnalysis {
    pub regions: RegionSet,

    pub has_forehead_region: bool,
    pub has_left_eye: bool,
    pub has_right_eye: bool,
    pub has_nose_region: bool,
    pub has_mouth_region: bool,
    pub has_lips: bool,
    pub has_chin_visible: bool,
    pub has_cheeks: bool,
    pub is_masked: bool,
    pub has_hat: bool,
    pub is_blurred: bool,

    pub brightness: f64,
    pub face_centeredness: f64,
    pub face_size: f64,
    pub eyes_clarity: f64,
    pub nose_clarity: f64,
    pub mouth_clarity: f64,
    pub overall_clarity: f64,
    pub cheek_skin_delta: f64,
    pub eye_variance_delta: f64,
}

/// Coarse classification of where skin appears in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinDistribution {
    FaceLike,
    RandomSkin,
    NoSkin,
}

impl FaceAnalysis {
    pub fn from_regions(regions: RegionSet, thresholds: &FaceValidationThresholds) -> Self {
        let t = thresholds;
        let r = &regions;

        let has_forehead_region = r.forehead.skin_ratio >= t.forehead_skin_ratio;
        let has_left_eye = eye_present(&r.left_eye, t);
        let has_right_eye = eye_present(&r.right_eye, t);
        let has_nose_region = r.nose.skin_ratio >= t.nose_skin_ratio;
        let has_mouth_region = r.mouth.skin_ratio >= t.mouth_skin_ratio;
        let has_lips = r.lips.skin_ratio >= t.lips_skin_ratio;
        let has_chin_visible = r.chin.skin_ratio >= t.chin_skin_ratio;
        let has_cheeks = r.left_cheek.skin_ratio >= t.cheek_skin_ratio
            && r.right_cheek.skin_ratio >= t.cheek_skin_ratio;

        let lower_skin = (r.mouth.skin_ratio + r.nose.skin_ratio + r.lips.skin_ratio) / 3.0;
        let lower_variance = (r.mouth.variance + r.nose.variance + r.lips.variance) / 3.0;
        let upper_skin =
            (r.forehead.skin_ratio + r.left_cheek.skin_ratio + r.right_cheek.skin_ratio) / 3.0;
        let is_masked = lower_skin < t.mask_lower_skin_max
            && upper_skin >= t.mask_upper_skin_min
            && lower_variance < t.mask_max_variance;

        let has_hat = r.top_of_frame.dark_ratio >= t.hat_dark_ratio
            && r.top_of_frame.variance <= t.hat_max_variance;

        let eyes_clarity = (r.left_eye.clarity + r.right_eye.clarity) / 2.0;
        let nose_clarity = r.nose.clarity;
        let mouth_clarity = (r.mouth.clarity + r.lips.clarity) / 2.0;
        let overall_clarity = r.center_face.clarity;
        let is_blurred = overall_clarity < t.min_overall_clarity
            || eyes_clarity < t.min_eyes_clarity
            || nose_clarity < t.min_nose_clarity
            || mouth_clarity < t.min_mouth_clarity;

        let face_size = (r.center_face.skin_ratio / t.full_face_skin_ratio).min(1.0);

        Self {
            has_forehead_region,
            has_left_eye,
            has_right_eye,
            has_nose_region,
            has_mouth_region,
            has_lips,
            has_chin_visible,
            has_cheeks,
            is_masked,
            has_hat,
            is_blurred,
            brightness: r.center_face.avg_brightness,
            face_centeredness: centeredness(r, t.centering_tolerance),
            face_size,
            eyes_clarity,
            nose_clarity,
            mouth_clarity,
            overall_clarity,
            cheek_skin_delta: (r.left_cheek.skin_ratio - r.right_cheek.skin_ratio).abs(),
            eye_variance_delta: (r.left_eye.variance - r.right_eye.variance).abs(),
            regions,
        }
    }

    /// Presence of forehead, both eyes, nose, mouth, both cheeks, and chin.
    pub fn presence_signals(&self) -> [bool; 6] {
        [
            self.has_forehead_region,
            self.has_left_eye && self.has_right_eye,
            self.has_nose_region,
            self.has_mouth_region,
            self.has_cheeks,
            self.has_chin_visible,
        ]
    }

    pub fn presence_count(&self) -> usize {
        self.presence_signals()
            .iter()
            .filter(|present| **present)
            .count()
    }

    pub fn has_face_structure(&self, thresholds: &FaceValidationThresholds) -> bool {
        self.presence_count() >= thresholds.min_face_regions
    }

    pub fn skin_distribution(&self, thresholds: &FaceValidationThresholds) -> SkinDistribution {
        let count = self.presence_count();
        let face_like = count >= thresholds.min_face_regions
            && self.cheek_skin_delta <= thresholds.max_cheek_skin_delta
            && self.eye_variance_delta <= thresholds.max_eye_variance_delta
            && !self.is_masked
            && self.face_centeredness > thresholds.min_centeredness;

        if face_like {
            SkinDistribution::FaceLike
        } else if count >= thresholds.random_skin_regions {
            SkinDistribution::RandomSkin
        } else {
            SkinDistribution::NoSkin
        }
    }
}

fn eye_present(stats: &RegionStats, thresholds: &FaceValidationThresholds) -> bool {
    stats.skin_ratio >= thresholds.eye_skin_ratio && stats.variance >= thresholds.eye_min_variance
}

/// Skin-weighted centroid of the feature regions compared to the centroid of
/// the region layout itself; 1.0 when they coincide, 0.0 at `tolerance` or
/// beyond, and 0.0 when no skin is present.
fn centeredness(regions: &RegionSet, tolerance: f64) -> f64 {
    let mut layout = (0.0, 0.0, 0.0);
    let mut skin = (0.0, 0.0, 0.0);

    for region in FaceRegion::features() {
        let bounds = region.bounds();
        let (cx, cy) = bounds.center();
        let area = bounds.area();
        layout = (layout.0 + area * cx, layout.1 + area * cy, layout.2 + area);

        let weight = area * regions.get(region).skin_ratio;
        skin = (skin.0 + weight * cx, skin.1 + weight * cy, skin.2 + weight);
    }

    if skin.2 <= f64::EPSILON || tolerance <= 0.0 {
        return 0.0;
    }

    let dx = skin.0 / skin.2 - layout.0 / layout.2;
    let dy = skin.1 / skin.2 - layout.1 / layout.2;
    let offset = (dx * dx + dy * dy).sqrt();

    (1.0 - offset / tolerance).clamp(0.0, 1.0)
}
