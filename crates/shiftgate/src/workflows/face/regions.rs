use serde::{Deserialize, Serialize};

use super::frame::CapturedFrame;

/// Pixels darker than this mean brightness count toward `dark_ratio`.
pub const DARK_PIXEL_BRIGHTNESS: f64 = 50.0;

/// Fixed facial sub-regions sampled from every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceRegion {
    TopOfFrame,
    Forehead,
    LeftEye,
    RightEye,
    Nose,
    LeftCheek,
    RightCheek,
    Mouth,
    Lips,
    Chin,
    CenterFace,
}

/// Fractional bounding box, `[x0, x1) x [y0, y1)` relative to the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl RegionBounds {
    const fn new(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub fn area(&self) -> f64 {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }
}

impl FaceRegion {
    pub const fn ordered() -> [Self; 11] {
        [
            Self::TopOfFrame,
            Self::Forehead,
            Self::LeftEye,
            Self::RightEye,
            Self::Nose,
            Self::LeftCheek,
            Self::RightCheek,
            Self::Mouth,
            Self::Lips,
            Self::Chin,
            Self::CenterFace,
        ]
    }

    /// Regions that describe facial features, excluding the framing bands.
    pub const fn features() -> [Self; 9] {
        [
            Self::Forehead,
            Self::LeftEye,
            Self::RightEye,
            Self::Nose,
            Self::LeftCheek,
            Self::RightCheek,
            Self::Mouth,
            Self::Lips,
            Self::Chin,
        ]
    }

    pub const fn bounds(self) -> RegionBounds {
        match self {
            Self::TopOfFrame => RegionBounds::new(0.25, 0.75, 0.00, 0.12),
            Self::Forehead => RegionBounds::new(0.35, 0.65, 0.15, 0.27),
            Self::LeftEye => RegionBounds::new(0.30, 0.45, 0.30, 0.40),
            Self::RightEye => RegionBounds::new(0.55, 0.70, 0.30, 0.40),
            Self::Nose => RegionBounds::new(0.43, 0.57, 0.40, 0.55),
            Self::LeftCheek => RegionBounds::new(0.25, 0.38, 0.45, 0.60),
            Self::RightCheek => RegionBounds::new(0.62, 0.75, 0.45, 0.60),
            Self::Mouth => RegionBounds::new(0.38, 0.62, 0.60, 0.70),
            Self::Lips => RegionBounds::new(0.42, 0.58, 0.62, 0.68),
            Self::Chin => RegionBounds::new(0.40, 0.60, 0.72, 0.82),
            Self::CenterFace => RegionBounds::new(0.30, 0.70, 0.25, 0.75),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TopOfFrame => "top_of_frame",
            Self::Forehead => "forehead",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::Nose => "nose",
            Self::LeftCheek => "left_cheek",
            Self::RightCheek => "right_cheek",
            Self::Mouth => "mouth",
            Self::Lips => "lips",
            Self::Chin => "chin",
            Self::CenterFace => "center_face",
        }
    }
}

/// Pixel statistics for one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub skin_ratio: f64,
    pub avg_brightness: f64,
    pub variance: f64,
    pub dark_ratio: f64,
    pub edge_strength: f64,
    pub clarity: f64,
}

impl RegionStats {
    pub fn clarity_of(variance: f64, edge_strength: f64) -> f64 {
        variance.max(0.0).sqrt() * (edge_strength / 10.0)
    }
}

/// Statistics for every region of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionSet {
    pub top_of_frame: RegionStats,
    pub forehead: RegionStats,
    pub left_eye: RegionStats,
    pub right_eye: RegionStats,
    pub nose: RegionStats,
    pub left_cheek: RegionStats,
    pub right_cheek: RegionStats,
    pub mouth: RegionStats,
    pub lips: RegionStats,
    pub chin: RegionStats,
    pub center_face: RegionStats,
}

impl RegionSet {
    pub fn get(&self, region: FaceRegion) -> &RegionStats {
        match region {
            FaceRegion::TopOfFrame => &self.top_of_frame,
            FaceRegion::Forehead => &self.forehead,
            FaceRegion::LeftEye => &self.left_eye,
            FaceRegion::RightEye => &self.right_eye,
            FaceRegion::Nose => &self.nose,
            FaceRegion::LeftCheek => &self.left_cheek,
            FaceRegion::RightCheek => &self.right_cheek,
            FaceRegion::Mouth => &self.mouth,
            FaceRegion::Lips => &self.lips,
            FaceRegion::Chin => &self.chin,
            FaceRegion::CenterFace => &self.center_face,
        }
    }

    pub fn get_mut(&mut self, region: FaceRegion) -> &mut RegionStats {
        match region {
            FaceRegion::TopOfFrame => &mut self.top_of_frame,
            FaceRegion::Forehead => &mut self.forehead,
            FaceRegion::LeftEye => &mut self.left_eye,
            FaceRegion::RightEye => &mut self.right_eye,
            FaceRegion::Nose => &mut self.nose,
            FaceRegion::LeftCheek => &mut self.left_cheek,
            FaceRegion::RightCheek => &mut self.right_cheek,
            FaceRegion::Mouth => &mut self.mouth,
            FaceRegion::Lips => &mut self.lips,
            FaceRegion::Chin => &mut self.chin,
            FaceRegion::CenterFace => &mut self.center_face,
        }
    }
}

/// Extracts per-region statistics from a frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceRegionAnalyzer;

impl FaceRegionAnalyzer {
    pub fn analyze(&self, frame: &CapturedFrame) -> RegionSet {
        let mut regions = RegionSet::default();
        for region in FaceRegion::ordered() {
            *regions.get_mut(region) = region_stats(frame, region.bounds());
        }
        regions
    }
}

/// Statistics over the pixels of `bounds`; regions that cover no pixel are all zero.
pub fn region_stats(frame: &CapturedFrame, bounds: RegionBounds) -> RegionStats {
    let (x_start, x_end) = pixel_span(bounds.x0, bounds.x1, frame.width());
    let (y_start, y_end) = pixel_span(bounds.y0, bounds.y1, frame.height());

    let mut samples = Vec::new();
    let mut skin = 0usize;
    let mut dark = 0usize;
    let mut edges = 0.0;
    let mut previous: Option<f64> = None;

    for y in y_start..y_end {
        for x in x_start..x_end {
            let Some(rgb) = frame.rgb(x, y) else {
                continue;
            };
            let brightness = brightness(rgb);

            samples.push(brightness);
            if is_skin_tone(rgb) {
                skin += 1;
            }
            if brightness < DARK_PIXEL_BRIGHTNESS {
                dark += 1;
            }
            if let Some(prev) = previous {
                edges += (brightness - prev).abs();
            }
            previous = Some(brightness);
        }
    }

    if samples.is_empty() {
        return RegionStats::default();
    }

    let n = samples.len() as f64;
    let avg_brightness = samples.iter().sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|value| (value - avg_brightness).powi(2))
        .sum::<f64>()
        / n;
    let edge_strength = edges / n;

    RegionStats {
        skin_ratio: skin as f64 / n,
        avg_brightness,
        variance,
        dark_ratio: dark as f64 / n,
        edge_strength,
        clarity: RegionStats::clarity_of(variance, edge_strength),
    }
}

fn pixel_span(start: f64, end: f64, extent: u32) -> (u32, u32) {
    let extent_f = f64::from(extent);
    let from = (start * extent_f).floor().clamp(0.0, extent_f) as u32;
    let to = (end * extent_f).floor().clamp(0.0, extent_f) as u32;
    (from, to.max(from))
}

pub fn brightness(rgb: [u8; 3]) -> f64 {
    (f64::from(rgb[0]) + f64::from(rgb[1]) + f64::from(rgb[2])) / 3.0
}

/// Three tone heuristics on R/G/B relationships: typical lit skin, bright
/// flash-lit skin, and deep tones under low light.
pub fn is_skin_tone(rgb: [u8; 3]) -> bool {
    let [r, g, b] = rgb.map(i32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    let typical = r > 95
        && g > 40
        && b > 20
        && max - min > 15
        && (r - g).abs() > 15
        && r > g
        && r > b;
    let flash_lit = r > 220 && g > 210 && b > 170 && (r - g).abs() <= 15 && r > b && g > b;
    let deep = r > 45 && g > 25 && b > 15 && r <= 140 && r > g && g >= b && r - g >= 8 && r - b >= 20;

    typical || flash_lit || deep
}
