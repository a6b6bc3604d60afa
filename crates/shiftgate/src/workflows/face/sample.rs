//! Synthetic frames: a textured two-tone face box on a plain wall. Used by the
//! demo camera and as fixtures.

use super::frame::{CapturedFrame, FrameError};

pub const SKIN_LIGHT: [u8; 3] = [215, 160, 130];
pub const SKIN_SHADE: [u8; 3] = [175, 120, 95];
pub const WALL_LIGHT: [u8; 3] = [128, 128, 128];
pub const WALL_SHADE: [u8; 3] = [100, 100, 100];
pub const FABRIC_LIGHT: [u8; 3] = [90, 90, 140];
pub const FABRIC_SHADE: [u8; 3] = [40, 40, 90];

/// Fractional box `(x0, x1, y0, y1)`.
pub type FractionalBox = (f64, f64, f64, f64);

/// Face box covering every feature region with margin.
pub const FACE_BOX: FractionalBox = (0.22, 0.78, 0.13, 0.86);

/// Checkerboard painter so every region carries texture.
#[derive(Debug, Clone)]
pub struct SampleFrame {
    frame: CapturedFrame,
}

impl SampleFrame {
    pub fn new(size: u32, light: [u8; 3], shade: [u8; 3]) -> Result<Self, FrameError> {
        let frame = CapturedFrame::solid(size, size, light)?;
        Ok(Self { frame }.paint((0.0, 1.0, 0.0, 1.0), light, shade))
    }

    pub fn wall(size: u32) -> Result<Self, FrameError> {
        Self::new(size, WALL_LIGHT, WALL_SHADE)
    }

    pub fn paint(mut self, (x0, x1, y0, y1): FractionalBox, light: [u8; 3], shade: [u8; 3]) -> Self {
        let width = f64::from(self.frame.width());
        let height = f64::from(self.frame.height());
        let (x_start, x_end) = ((x0 * width) as u32, (x1 * width) as u32);
        let (y_start, y_end) = ((y0 * height) as u32, (y1 * height) as u32);
        for y in y_start..y_end {
            for x in x_start..x_end {
                let rgb = if (x + y) % 2 == 0 { light } else { shade };
                self.frame.set_rgb(x, y, rgb);
            }
        }
        self
    }

    pub fn face(self) -> Self {
        self.paint(FACE_BOX, SKIN_LIGHT, SKIN_SHADE)
    }

    /// Covers the mouth band with fabric.
    pub fn masked(self) -> Self {
        self.paint((0.38, 0.62, 0.60, 0.70), FABRIC_LIGHT, FABRIC_SHADE)
    }

    pub fn build(self) -> CapturedFrame {
        self.frame
    }
}

/// Well-lit, centred face that clears every gate.
pub fn face_frame(size: u32) -> Result<CapturedFrame, FrameError> {
    Ok(SampleFrame::wall(size)?.face().build())
}

/// Empty wall with no skin.
pub fn wall_frame(size: u32) -> Result<CapturedFrame, FrameError> {
    Ok(SampleFrame::wall(size)?.build())
}
