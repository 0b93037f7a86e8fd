//! Geometric shapes.

use super::text::draw_text_block;
use crate::context::DrawContext;
use canvink_core::{ElementStyle, ShapeData, ShapeKind};
use kurbo::{BezPath, Circle, Ellipse, Point, Rect, RoundedRect, Shape, Size};
use peniko::Color;
use std::f64::consts::{FRAC_PI_2, PI};

const TOLERANCE: f64 = 0.1;

/// Outline of `kind` inside the frame `(0, 0, size)`.
pub fn shape_path(kind: ShapeKind, size: Size, corner_radius: f64) -> BezPath {
    let rect = Rect::from_origin_size(Point::ZERO, size);
    match kind {
        ShapeKind::Rectangle if corner_radius > 0.0 => {
            let radius = corner_radius.min(size.width / 2.0).min(size.height / 2.0);
            RoundedRect::from_rect(rect, radius).to_path(TOLERANCE)
        }
        ShapeKind::Rectangle => rect.to_path(TOLERANCE),
        ShapeKind::Circle => {
            Circle::new(rect.center(), size.width.min(size.height) / 2.0).to_path(TOLERANCE)
        }
        ShapeKind::Ellipse => Ellipse::from_rect(rect).to_path(TOLERANCE),
        ShapeKind::Triangle => closed_polygon(&[
            Point::new(size.width / 2.0, 0.0),
            Point::new(size.width, size.height),
            Point::new(0.0, size.height),
        ]),
        ShapeKind::Diamond => closed_polygon(&[
            Point::new(size.width / 2.0, 0.0),
            Point::new(size.width, size.height / 2.0),
            Point::new(size.width / 2.0, size.height),
            Point::new(0.0, size.height / 2.0),
        ]),
        ShapeKind::Star => star_path(rect, 5, 0.4),
    }
}

/// Star with `points` spikes filling `rect`, first spike pointing up.
pub fn star_path(rect: Rect, points: usize, inner_ratio: f64) -> BezPath {
    let center = rect.center();
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    let steps = points * 2;
    let vertices: Vec<Point> = (0..steps)
        .map(|i| {
            let angle = -FRAC_PI_2 + PI * i as f64 / points as f64;
            let k = if i % 2 == 0 { 1.0 } else { inner_ratio };
            Point::new(center.x + rx * k * angle.cos(), center.y + ry * k * angle.sin())
        })
        .collect();
    closed_polygon(&vertices)
}

/// Regular polygon with `sides` corners inscribed in `rect`, first corner up.
pub fn polygon_path(rect: Rect, sides: usize) -> BezPath {
    let center = rect.center();
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    let vertices: Vec<Point> = (0..sides)
        .map(|i| {
            let angle = -FRAC_PI_2 + 2.0 * PI * i as f64 / sides as f64;
            Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
        })
        .collect();
    closed_polygon(&vertices)
}

pub(crate) fn closed_polygon(vertices: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = vertices.split_first() else {
        return path;
    };
    path.move_to(*first);
    for p in rest {
        path.line_to(*p);
    }
    path.close_path();
    path
}

pub(super) fn draw_shape<C: DrawContext + ?Sized>(
    ctx: &mut C,
    style: &ElementStyle,
    data: &ShapeData,
    size: Size,
    scale: f64,
) {
    let path = shape_path(data.kind, size, data.corner_radius * scale);
    if style.fill.is_some() {
        ctx.fill_path(&path);
    }
    if style.stroke.is_some() {
        ctx.stroke_path(&path);
    }

    if let Some(text) = &data.text {
        ctx.save();
        // Label color: the outline color when there is one, black otherwise.
        let color = style
            .stroke
            .map(Color::from)
            .unwrap_or_else(|| Color::from_rgba8(0, 0, 0, 255));
        ctx.set_fill_color(color);
        ctx.set_line_dash(&[]);
        draw_text_block(ctx, text, size);
        ctx.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawOp, RecordingContext};
    use canvink_core::SerializableColor;

    #[test]
    fn test_paths_stay_inside_frame() {
        let size = Size::new(120.0, 80.0);
        let frame = Rect::from_origin_size(Point::ZERO, size);
        for kind in [
            ShapeKind::Rectangle,
            ShapeKind::Circle,
            ShapeKind::Triangle,
            ShapeKind::Diamond,
            ShapeKind::Ellipse,
            ShapeKind::Star,
        ] {
            let bbox = shape_path(kind, size, 10.0).bounding_box();
            // Curve approximations may bulge by a fraction of the tolerance.
            assert!(
                bbox.x0 >= -0.1
                    && bbox.y0 >= -0.1
                    && bbox.x1 <= frame.x1 + 0.1
                    && bbox.y1 <= frame.y1 + 0.1,
                "{kind:?} escapes frame: {bbox:?}"
            );
        }
    }

    #[test]
    fn test_circle_uses_smaller_side() {
        let bbox = shape_path(ShapeKind::Circle, Size::new(100.0, 40.0), 0.0).bounding_box();
        assert!((bbox.width() - 40.0).abs() < 1e-6);
        assert!((bbox.center().x - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_star_first_point_is_top_center() {
        let path = star_path(Rect::new(0.0, 0.0, 100.0, 100.0), 5, 0.4);
        let kurbo::PathEl::MoveTo(first) = path.elements()[0] else {
            panic!("path must start with move_to");
        };
        assert!((first.x - 50.0).abs() < 1e-9);
        assert!(first.y.abs() < 1e-9);
    }

    #[test]
    fn test_fill_and_stroke_follow_style() {
        let data = ShapeData::new(ShapeKind::Ellipse);
        let size = Size::new(10.0, 10.0);

        let mut ctx = RecordingContext::new(20, 20);
        draw_shape(&mut ctx, &ElementStyle::default(), &data, size, 1.0);
        assert!(ctx.ops().is_empty());

        let style = ElementStyle::default().with_fill(SerializableColor::white());
        draw_shape(&mut ctx, &style, &data, size, 1.0);
        assert!(matches!(ctx.ops(), [DrawOp::Fill { .. }]));

        let style = style.with_stroke(SerializableColor::black(), 1.0);
        draw_shape(&mut ctx, &style, &data, size, 1.0);
        assert!(matches!(
            ctx.ops(),
            [DrawOp::Fill { .. }, DrawOp::Fill { .. }, DrawOp::Stroke { .. }]
        ));
    }
}
