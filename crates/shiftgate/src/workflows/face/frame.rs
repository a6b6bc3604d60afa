use serde::{Deserialize, Serialize};

/// One captured photo as a row-major RGBA buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct CapturedFrame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero (got {width}x{height})")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("expected {expected} RGBA bytes for the frame, found {found}")]
    BufferLength { expected: usize, found: usize },
}

#[derive(Deserialize)]
struct RawFrame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl TryFrom<RawFrame> for CapturedFrame {
    type Error = FrameError;

    fn try_from(value: RawFrame) -> Result<Self, Self::Error> {
        CapturedFrame::new(value.width, value.height, value.rgba)
    }
}

impl CapturedFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions { width, height });
        }

        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(FrameError::BufferLength {
                expected,
                found: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Frame filled with a single opaque color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, FrameError> {
        let pixels = width as usize * height as usize;
        let mut rgba = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            rgba.extend_from_slice(&[rgb[0], rgb[1], rgb[2], u8::MAX]);
        }
        Self::new(width, height, rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// RGB components at `(x, y)`; alpha is ignored by the analyzer.
    pub fn rgb(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.rgba[offset],
            self.rgba[offset + 1],
            self.rgba[offset + 2],
        ])
    }

    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[offset..offset + 3].copy_from_slice(&rgb);
        self.rgba[offset + 3] = u8::MAX;
    }
}
