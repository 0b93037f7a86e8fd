//! Viewport module: the current pan/zoom window onto virtual space.

use kurbo::{Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed zoom level.
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed zoom level.
pub const MAX_SCALE: f64 = 5.0;

/// Clamp a requested scale into `[MIN_SCALE, MAX_SCALE]`.
///
/// Non-finite requests fall back to 1.0 so a bad wheel delta can never
/// poison the viewport.
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

/// The current pan/zoom state.
///
/// `offset` is stored in screen pixels: a virtual point `p` lands on the
/// surface at `p * scale + offset`. The value is `Copy`; the only owner that
/// mutates one in place is [`ViewportManager`](crate::ViewportManager),
/// everyone else works on copies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawViewport")]
pub struct Viewport {
    scale: f64,
    offset: Vec2,
    width: u32,
    height: u32,
}

/// Unchecked wire form; converting it clamps the scale.
#[derive(Deserialize)]
struct RawViewport {
    scale: f64,
    offset: Vec2,
    width: u32,
    height: u32,
}

impl From<RawViewport> for Viewport {
    fn from(raw: RawViewport) -> Self {
        Self {
            scale: clamp_scale(raw.scale),
            offset: raw.offset,
            width: raw.width,
            height: raw.height,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            width: 0,
            height: 0,
        }
    }
}

impl Viewport {
    /// Create a viewport of the given pixel size at scale 1 and no pan.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Current zoom level, always within `[MIN_SCALE, MAX_SCALE]`.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Current pan offset in screen pixels.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Surface size in pixels.
    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    /// Copy with a new scale (clamped). The offset is left untouched.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = clamp_scale(scale);
        self
    }

    /// Copy with a new offset.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Copy with a new pixel size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
