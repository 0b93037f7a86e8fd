//! Freehand paths.

use crate::context::DrawContext;
use kurbo::{BezPath, Circle, Point, Shape};

/// Smoothed outline through `points`.
///
/// Each interior point becomes the control point of a quadratic segment that
/// ends halfway to the next point; the last point is joined with a straight
/// line. Two points give a straight segment. Fewer give an empty path.
pub fn smooth_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if points.len() < 2 {
        return path;
    }
    path.move_to(points[0]);
    if points.len() > 2 {
        for pair in points[1..].windows(2) {
            path.quad_to(pair[0], pair[0].midpoint(pair[1]));
        }
    }
    path.line_to(points[points.len() - 1]);
    path
}

pub(super) fn draw_path<C: DrawContext + ?Sized>(ctx: &mut C, points: &[Point]) {
    if points.len() < 2 {
        // A tap leaves a dot the size of the stroke.
        let center = points.first().copied().unwrap_or(Point::ZERO);
        let radius = ctx.state().line_width / 2.0;
        ctx.save();
        let color = ctx.state().stroke_color;
        ctx.set_fill_color(color);
        ctx.fill_path(&Circle::new(center, radius).to_path(0.1));
        ctx.restore();
        return;
    }
    ctx.stroke_path(&smooth_path(points));
}
