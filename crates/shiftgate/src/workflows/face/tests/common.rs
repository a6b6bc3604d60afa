use crate::workflows::face::sample::{self, SampleFrame};
use crate::workflows::face::{
    CapturedFrame, FaceAnalysis, FaceValidationPipeline, FaceValidationThresholds, RegionSet,
    RegionStats,
};

pub(super) const FRAME_SIZE: u32 = 200;

pub(super) fn pipeline() -> FaceValidationPipeline {
    FaceValidationPipeline::new(FaceValidationThresholds::default())
}

/// Analysis that clears every gate; tests flip exactly one signal.
pub(super) fn passing_analysis() -> FaceAnalysis {
    let face = RegionStats {
        skin_ratio: 0.92,
        avg_brightness: 150.0,
        variance: 370.0,
        dark_ratio: 0.0,
        edge_strength: 37.0,
        clarity: 71.0,
    };
    let regions = RegionSet {
        top_of_frame: RegionStats {
            skin_ratio: 0.0,
            avg_brightness: 114.0,
            variance: 196.0,
            dark_ratio: 0.0,
            edge_strength: 27.0,
            clarity: 37.8,
        },
        forehead: face,
        left_eye: face,
        right_eye: face,
        nose: face,
        left_cheek: face,
        right_cheek: face,
        mouth: face,
        lips: face,
        chin: face,
        center_face: face,
    };

    FaceAnalysis {
        regions,
        has_forehead_region: true,
        has_left_eye: true,
        has_right_eye: true,
        has_nose_region: true,
        has_mouth_region: true,
        has_lips: true,
        has_chin_visible: true,
        has_cheeks: true,
        is_masked: false,
        has_hat: false,
        is_blurred: false,
        brightness: 150.0,
        face_centeredness: 0.95,
        face_size: 1.0,
        eyes_clarity: 71.0,
        nose_clarity: 71.0,
        mouth_clarity: 71.0,
        overall_clarity: 71.0,
        cheek_skin_delta: 0.0,
        eye_variance_delta: 0.0,
    }
}

pub(super) fn textured(light: [u8; 3], shade: [u8; 3]) -> SampleFrame {
    SampleFrame::new(FRAME_SIZE, light, shade).expect("frame")
}

pub(super) fn wall() -> SampleFrame {
    SampleFrame::wall(FRAME_SIZE).expect("frame")
}

pub(super) fn face_frame() -> CapturedFrame {
    sample::face_frame(FRAME_SIZE).expect("frame")
}
