//! Per-element draw routines.
//!
//! Every element is drawn inside its own frame: [`place_element`] moves the
//! context origin to the element's screen-space top-left, rotated about the
//! screen-space center. Inside the frame, geometry is laid out in screen
//! units (`0..w*scale`, `0..h*scale`), and relative point data is reprojected
//! by multiplying with the scale. The main render, the preview render and
//! any export path all go through [`draw_element`].

mod arrow;
mod path;
mod raster;
mod shape;
mod text;

pub use arrow::{Arrowhead, arrowhead_geometry, arrowhead_path, polyline};
pub use path::smooth_path;
pub use raster::{clip_shape_path, draw_placeholder};
pub use shape::{polygon_path, shape_path, star_path};
pub use text::draw_text_block;

use crate::config::RenderConfig;
use crate::context::DrawContext;
use crate::images::ImageLoader;
use canvink_core::{CanvasElement, CoordinateTransformer, ElementData, ElementStyle, FontSpec};
use kurbo::{Affine, Point, Size};

/// Everything a draw routine needs besides the element and the context.
pub struct DrawEnv<'a> {
    pub transformer: CoordinateTransformer,
    pub images: &'a mut ImageLoader,
    pub config: &'a RenderConfig,
    /// Dash forced on every stroke (preview styling).
    pub dash_override: Option<&'a [f64]>,
}

impl<'a> DrawEnv<'a> {
    pub fn new(
        transformer: CoordinateTransformer,
        images: &'a mut ImageLoader,
        config: &'a RenderConfig,
    ) -> Self {
        Self {
            transformer,
            images,
            config,
            dash_override: None,
        }
    }

    pub fn with_dash_override(mut self, dash: &'a [f64]) -> Self {
        self.dash_override = Some(dash);
        self
    }

    pub fn scale(&self) -> f64 {
        self.transformer.scale()
    }
}

/// Screen-space frame of `element`: maps local frame coordinates
/// (`0..w*scale`, `0..h*scale`) to surface pixels.
pub fn element_frame(element: &CanvasElement, transformer: &CoordinateTransformer) -> Affine {
    let center = transformer.virtual_to_screen(element.center());
    let size = transformer.virtual_size_to_screen(element.size);
    Affine::translate(center.to_vec2())
        * Affine::rotate(element.rotation_radians())
        * Affine::translate((-size.width / 2.0, -size.height / 2.0))
}

/// Install the element frame on `ctx`.
///
/// The context is expected to be at screen identity (no viewport matrix).
pub fn place_element<C: DrawContext + ?Sized>(
    ctx: &mut C,
    element: &CanvasElement,
    transformer: &CoordinateTransformer,
) {
    ctx.concat(element_frame(element, transformer));
}

/// Element size in frame units.
pub fn frame_size(element: &CanvasElement, transformer: &CoordinateTransformer) -> Size {
    transformer.virtual_size_to_screen(element.size)
}

/// Relative point data reprojected into frame units.
pub fn frame_points(points: &[Point], scale: f64) -> Vec<Point> {
    points
        .iter()
        .map(|p| Point::new(p.x * scale, p.y * scale))
        .collect()
}

/// Set the context properties present in `style`. Lengths are scaled into
/// frame units; opacity multiplies the current global alpha.
pub fn apply_style<C: DrawContext + ?Sized>(ctx: &mut C, style: &ElementStyle, scale: f64) {
    if let Some(fill) = style.fill {
        ctx.set_fill_color(fill.into());
    }
    if let Some(stroke) = style.stroke {
        ctx.set_stroke_color(stroke.into());
    }
    if let Some(width) = style.stroke_width {
        ctx.set_line_width(width * scale);
    }
    if let Some(opacity) = style.opacity {
        let alpha = ctx.state().global_alpha * opacity.clamp(0.0, 1.0);
        ctx.set_global_alpha(alpha);
    }
    if let Some(font) = &style.font {
        ctx.set_font(FontSpec {
            size: font.size * scale,
            ..font.clone()
        });
    }
    if let Some(dash) = &style.line_dash {
        let scaled: Vec<f64> = dash.iter().map(|d| d * scale).collect();
        ctx.set_line_dash(&scaled);
    }
}

/// Draw one element. Leaves the context state as it found it.
pub fn draw_element<C: DrawContext + ?Sized>(
    ctx: &mut C,
    element: &CanvasElement,
    env: &mut DrawEnv<'_>,
) {
    let scale = env.scale();
    ctx.save();
    place_element(ctx, element, &env.transformer);
    apply_style(ctx, &element.style, scale);
    if let Some(dash) = env.dash_override {
        ctx.set_line_dash(dash);
    }

    let size = frame_size(element, &env.transformer);
    match &element.data {
        ElementData::Shape(data) => shape::draw_shape(ctx, &element.style, data, size, scale),
        ElementData::Text(content) => text::draw_text_block(ctx, content, size),
        ElementData::Path(data) => path::draw_path(ctx, &frame_points(&data.points, scale)),
        ElementData::Image(data) => raster::draw_image_element(ctx, element, data, size, env),
        ElementData::Arrow(data) => {
            if data.points.len() < 2 {
                log::trace!("Arrow {} has fewer than 2 points, skipping", element.id);
            } else {
                arrow::draw_arrow(ctx, &frame_points(&data.points, scale), data, scale);
            }
        }
        ElementData::Line(data) => {
            if data.points.len() < 2 {
                log::trace!("Line {} has fewer than 2 points, skipping", element.id);
            } else {
                arrow::draw_line(ctx, &frame_points(&data.points, scale));
            }
        }
    }
    ctx.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::apply_viewport;
    use crate::recording::{DrawOp, RecordingContext};
    use kurbo::Shape;
    use canvink_core::{SerializableColor, ShapeKind, Viewport};
    use kurbo::{Rect, Vec2};

    fn transformer(scale: f64, offset: (f64, f64)) -> CoordinateTransformer {
        CoordinateTransformer::new(
            Viewport::new(800, 600)
                .with_scale(scale)
                .with_offset(Vec2::new(offset.0, offset.1)),
        )
    }

    #[test]
    fn test_frame_origin_matches_example() {
        let element = CanvasElement::shape(
            ShapeKind::Rectangle,
            Point::new(200.0, 150.0),
            Size::new(40.0, 20.0),
        );
        let frame = element_frame(&element, &transformer(1.5, (100.0, 50.0)));
        let origin = frame * Point::ZERO;
        assert!((origin.x - 400.0).abs() < 1e-9);
        assert!((origin.y - 275.0).abs() < 1e-9);
    }

    #[test]
    fn test_place_element_matches_context_native_transform() {
        // Context-native route: viewport matrix, then per-element placement
        // in virtual units, then back to frame units.
        for rotation in [0.0, 30.0, 90.0, 217.5] {
            let cameras = [(1.0, (0.0, 0.0)), (0.35, (-120.0, 40.0)), (4.2, (310.0, -95.5))];
            for (scale, offset) in cameras {
                let t = transformer(scale, offset);
                let element = CanvasElement::shape(
                    ShapeKind::Diamond,
                    Point::new(-35.0, 82.0),
                    Size::new(120.0, 48.0),
                )
                .with_rotation(rotation);

                let mut manual = RecordingContext::new(800, 600);
                place_element(&mut manual, &element, &t);

                let mut native = RecordingContext::new(800, 600);
                apply_viewport(&mut native, t.viewport());
                let center = element.center();
                native.translate(center.x, center.y);
                native.rotate(element.rotation_radians());
                native.translate(-element.size.width / 2.0, -element.size.height / 2.0);
                native.scale(1.0 / scale, 1.0 / scale);

                let corner = Point::new(120.0 * scale, 48.0 * scale);
                for local in [Point::ZERO, corner, Point::new(7.0, 3.0)] {
                    let a = manual.transform() * local;
                    let b = native.transform() * local;
                    assert!(
                        (a - b).hypot() < 1e-6,
                        "rotation {rotation}, scale {scale}: {a:?} vs {b:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_apply_style_only_sets_present_fields() {
        let mut ctx = RecordingContext::new(10, 10);
        ctx.set_fill_color(SerializableColor::rgb(1, 2, 3).into());
        let style = ElementStyle::default()
            .with_stroke(SerializableColor::rgb(200, 0, 0), 2.0)
            .with_opacity(0.5)
            .with_line_dash(vec![4.0, 2.0]);
        apply_style(&mut ctx, &style, 2.0);

        let state = ctx.state();
        assert_eq!(SerializableColor::from(state.fill_color), SerializableColor::rgb(1, 2, 3));
        assert_eq!(SerializableColor::from(state.stroke_color), SerializableColor::rgb(200, 0, 0));
        assert!((state.line_width - 4.0).abs() < f64::EPSILON);
        assert!((state.global_alpha - 0.5).abs() < f64::EPSILON);
        assert_eq!(state.line_dash, vec![8.0, 4.0]);
    }

    #[test]
    fn test_draw_element_restores_state() {
        let mut images = ImageLoader::default();
        let config = RenderConfig::default();
        let mut env = DrawEnv::new(transformer(2.0, (10.0, 10.0)), &mut images, &config);
        let style = ElementStyle::default().with_fill(SerializableColor::rgb(0, 0, 255));
        let size = Size::new(10.0, 10.0);
        let element = CanvasElement::shape(ShapeKind::Rectangle, Point::new(5.0, 5.0), size)
            .with_rotation(45.0)
            .with_style(style);

        let mut ctx = RecordingContext::new(100, 100);
        draw_element(&mut ctx, &element, &mut env);
        assert_eq!(ctx.save_depth(), 0);
        assert_eq!(ctx.transform(), Affine::IDENTITY);

        let fill = ctx
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Fill { path, transform, .. } => {
                    Some(transform.transform_rect_bbox(path.bounding_box()))
                }
                _ => None,
            })
            .unwrap();
        // 45 degree rotation of a 20x20 square centered at (30, 30).
        let half_diag = 10.0 * 2f64.sqrt();
        let expected = Rect::from_center_size((30.0, 30.0), (2.0 * half_diag, 2.0 * half_diag));
        assert!((fill.x0 - expected.x0).abs() < 1e-6);
        assert!((fill.y1 - expected.y1).abs() < 1e-6);
    }

    #[test]
    fn test_short_arrow_draws_nothing() {
        let mut images = ImageLoader::default();
        let config = RenderConfig::default();
        let mut env = DrawEnv::new(transformer(1.0, (0.0, 0.0)), &mut images, &config);
        let element = CanvasElement::arrow(vec![Point::ZERO], Point::ZERO, Size::new(1.0, 1.0));

        let mut ctx = RecordingContext::new(100, 100);
        draw_element(&mut ctx, &element, &mut env);
        assert!(ctx.ops().is_empty());
    }
}
