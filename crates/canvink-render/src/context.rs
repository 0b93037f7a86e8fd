//! Immediate-mode 2D drawing context abstraction.
//!
//! [`DrawContext`] mirrors the semantics of an HTML canvas 2D context: every
//! property set on it (transform, colors, line width, alpha, dash, font,
//! filters, shadow) persists until changed or until a `restore` pops the
//! state saved by the matching `save`. Geometry is handed over as
//! [`kurbo::BezPath`] values.

use crate::renderer::RendererError;
use canvink_core::{CoordinateTransformer, FontSpec, ImageFilters, TextAlign, Viewport};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use peniko::Color;
use std::sync::Arc;

/// Vertical anchor used by `fill_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    Top,
    Middle,
    #[default]
    Alphabetic,
    Bottom,
}

/// Drop shadow applied to fills and text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub offset: Vec2,
    pub blur: f64,
}

/// Drawing properties saved and restored as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    pub transform: Affine,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f64,
    pub global_alpha: f64,
    pub line_dash: Vec<f64>,
    pub font: FontSpec,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
    pub filters: ImageFilters,
    pub shadow: Option<Shadow>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill_color: Color::from_rgba8(0, 0, 0, 255),
            stroke_color: Color::from_rgba8(0, 0, 0, 255),
            line_width: 1.0,
            global_alpha: 1.0,
            line_dash: Vec::new(),
            font: FontSpec::new("sans-serif", 10.0),
            text_align: TextAlign::Left,
            text_baseline: TextBaseline::default(),
            filters: ImageFilters::default(),
            shadow: None,
        }
    }
}

/// Decoded raster in straight (non-premultiplied) RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Bitmap {
    /// Wrap RGBA8 pixels; `None` if the buffer length does not match.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if width == 0 || height == 0 || pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether both bitmaps share one pixel buffer.
    pub(crate) fn same_pixels(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }
}

/// An immediate-mode raster surface.
pub trait DrawContext {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Reallocate the surface. Clears content and resets the state stack.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError>;

    /// Current drawing state.
    fn state(&self) -> &DrawState;

    /// Mutable drawing state.
    fn state_mut(&mut self) -> &mut DrawState;

    /// Push the current state (including clip).
    fn save(&mut self);

    /// Pop the last saved state. No-op on an empty stack.
    fn restore(&mut self);

    /// Number of saved states.
    fn save_depth(&self) -> usize;

    /// Clear every pixel to transparent, ignoring transform and clip.
    fn clear(&mut self);

    /// Fill a path with the fill color under the current transform.
    fn fill_path(&mut self, path: &BezPath);

    /// Stroke a path with the stroke color, line width and dash.
    fn stroke_path(&mut self, path: &BezPath);

    /// Intersect the clip region with a path.
    fn clip(&mut self, path: &BezPath);

    /// Draw a single line of text using font, alignment and baseline.
    fn fill_text(&mut self, text: &str, origin: Point);

    /// Advance width of `text` in the current font, in local units.
    fn measure_text(&self, text: &str) -> f64;

    /// Draw a bitmap scaled into `dest` (local units), with the current
    /// filters applied.
    fn draw_image(&mut self, bitmap: &Bitmap, dest: Rect);

    fn transform(&self) -> Affine {
        self.state().transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.state_mut().transform = transform;
    }

    fn reset_transform(&mut self) {
        self.set_transform(Affine::IDENTITY);
    }

    /// Post-multiply the current transform (canvas `transform()`).
    fn concat(&mut self, transform: Affine) {
        let state = self.state_mut();
        state.transform *= transform;
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.concat(Affine::translate((dx, dy)));
    }

    fn rotate(&mut self, radians: f64) {
        self.concat(Affine::rotate(radians));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.concat(Affine::scale_non_uniform(sx, sy));
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state_mut().fill_color = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.state_mut().stroke_color = color;
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state_mut().line_width = width;
        }
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        if alpha.is_finite() {
            self.state_mut().global_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn set_line_dash(&mut self, dash: &[f64]) {
        // Canvas ignores dash arrays with negative or non-finite entries.
        if dash.iter().all(|d| d.is_finite() && *d >= 0.0) {
            self.state_mut().line_dash = dash.to_vec();
        }
    }

    fn set_font(&mut self, font: FontSpec) {
        self.state_mut().font = font;
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.state_mut().text_align = align;
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state_mut().text_baseline = baseline;
    }

    fn set_filters(&mut self, filters: ImageFilters) {
        self.state_mut().filters = filters;
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state_mut().shadow = shadow;
    }
}

/// Install the viewport's virtual → screen matrix on the context.
///
/// Afterwards geometry can be issued in virtual units. This produces the same
/// placement as [`CoordinateTransformer::virtual_to_screen`] per point.
pub fn apply_viewport<C: DrawContext + ?Sized>(ctx: &mut C, viewport: Viewport) {
    ctx.set_transform(CoordinateTransformer::new(viewport).to_affine());
}

/// Clear the viewport matrix, returning to raw screen pixels.
pub fn reset_viewport<C: DrawContext + ?Sized>(ctx: &mut C) {
    ctx.reset_transform();
}

/// Horizontal start of a text run of `width` anchored at `x`.
pub(crate) fn aligned_start(x: f64, width: f64, align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::Right => x - width,
    }
}

/// Baseline y for text anchored at `y` with the given font size.
///
/// Uses fixed em fractions (ascent 0.8, descent 0.2) so every backend agrees.
pub(crate) fn baseline_y(y: f64, font_size: f64, baseline: TextBaseline) -> f64 {
    match baseline {
        TextBaseline::Top => y + font_size * 0.8,
        TextBaseline::Middle => y + font_size * 0.3,
        TextBaseline::Alphabetic => y,
        TextBaseline::Bottom => y - font_size * 0.2,
    }
}
