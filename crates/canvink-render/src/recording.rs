//! Display-list backend.
//!
//! [`RecordingContext`] implements [`DrawContext`] without pixels: every draw
//! call is appended to a list of [`DrawOp`]s together with the transform and
//! paint state in effect, so pipeline behavior can be inspected directly.

use crate::context::{Bitmap, DrawContext, DrawState, TextBaseline};
use crate::renderer::RendererError;
use canvink_core::{FontSpec, ImageFilters, TextAlign};
use kurbo::{Affine, BezPath, Point, Rect};
use peniko::Color;

/// Advance per character, in ems.
const ADVANCE_EM: f64 = 0.6;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Fill {
        path: BezPath,
        transform: Affine,
        color: Color,
        alpha: f64,
    },
    Stroke {
        path: BezPath,
        transform: Affine,
        color: Color,
        width: f64,
        dash: Vec<f64>,
        alpha: f64,
    },
    Clip {
        path: BezPath,
        transform: Affine,
    },
    Text {
        text: String,
        origin: Point,
        transform: Affine,
        font: FontSpec,
        align: TextAlign,
        baseline: TextBaseline,
        color: Color,
        alpha: f64,
    },
    Image {
        width: u32,
        height: u32,
        dest: Rect,
        transform: Affine,
        filters: ImageFilters,
        alpha: f64,
    },
}

impl DrawOp {
    /// Transform the op was issued under (`None` for `Clear`).
    pub fn transform(&self) -> Option<Affine> {
        match self {
            DrawOp::Clear => None,
            DrawOp::Fill { transform, .. }
            | DrawOp::Stroke { transform, .. }
            | DrawOp::Clip { transform, .. }
            | DrawOp::Text { transform, .. }
            | DrawOp::Image { transform, .. } => Some(*transform),
        }
    }

    /// Global alpha the op was issued with.
    pub fn alpha(&self) -> Option<f64> {
        match self {
            DrawOp::Fill { alpha, .. }
            | DrawOp::Stroke { alpha, .. }
            | DrawOp::Text { alpha, .. }
            | DrawOp::Image { alpha, .. } => Some(*alpha),
            DrawOp::Clear | DrawOp::Clip { .. } => None,
        }
    }
}

/// A [`DrawContext`] that records instead of rasterizing.
#[derive(Debug, Clone)]
pub struct RecordingContext {
    width: u32,
    height: u32,
    state: DrawState,
    stack: Vec<DrawState>,
    ops: Vec<DrawOp>,
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: DrawState::default(),
            stack: Vec::new(),
            ops: Vec::new(),
        }
    }

    /// Everything recorded so far.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drain the recorded ops.
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of `clear` calls recorded.
    pub fn clear_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Clear)).count()
    }

    /// Recorded text runs, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Ops recorded after the last `clear`.
    pub fn since_last_clear(&self) -> &[DrawOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| matches!(op, DrawOp::Clear))
            .map_or(0, |i| i + 1);
        &self.ops[start..]
    }
}

impl DrawContext for RecordingContext {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidSurfaceSize { width, height });
        }
        self.width = width;
        self.height = height;
        self.state = DrawState::default();
        self.stack.clear();
        Ok(())
    }

    fn state(&self) -> &DrawState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DrawState {
        &mut self.state
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn save_depth(&self) -> usize {
        self.stack.len()
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn fill_path(&mut self, path: &BezPath) {
        self.ops.push(DrawOp::Fill {
            path: path.clone(),
            transform: self.state.transform,
            color: self.state.fill_color,
            alpha: self.state.global_alpha,
        });
    }

    fn stroke_path(&mut self, path: &BezPath) {
        self.ops.push(DrawOp::Stroke {
            path: path.clone(),
            transform: self.state.transform,
            color: self.state.stroke_color,
            width: self.state.line_width,
            dash: self.state.line_dash.clone(),
            alpha: self.state.global_alpha,
        });
    }

    fn clip(&mut self, path: &BezPath) {
        self.ops.push(DrawOp::Clip {
            path: path.clone(),
            transform: self.state.transform,
        });
    }

    fn fill_text(&mut self, text: &str, origin: Point) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            origin,
            transform: self.state.transform,
            font: self.state.font.clone(),
            align: self.state.text_align,
            baseline: self.state.text_baseline,
            color: self.state.fill_color,
            alpha: self.state.global_alpha,
        });
    }

    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.state.font.size * ADVANCE_EM
    }

    fn draw_image(&mut self, bitmap: &Bitmap, dest: Rect) {
        self.ops.push(DrawOp::Image {
            width: bitmap.width(),
            height: bitmap.height(),
            dest,
            transform: self.state.transform,
            filters: self.state.filters,
            alpha: self.state.global_alpha,
        });
    }
}
