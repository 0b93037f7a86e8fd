//! Arrows and straight lines.

use super::shape::closed_polygon;
use crate::context::DrawContext;
use canvink_core::{ArrowData, ArrowHeadShape, ArrowType};
use kurbo::{BezPath, Circle, Point, Shape, Vec2};
use std::f64::consts::FRAC_PI_6;

/// Where one arrowhead sits and which way it points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrowhead {
    /// Endpoint the head is attached to.
    pub tip: Point,
    /// Direction of travel into the tip, in radians.
    pub angle: f64,
}

impl Arrowhead {
    fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }
}

/// Heads for a polyline: one at the last point, plus one at the first point
/// for bidirectional arrows. Both point away from the line.
pub fn arrowhead_geometry(points: &[Point], arrow_type: ArrowType) -> Vec<Arrowhead> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let mut heads = Vec::with_capacity(2);
    if arrow_type == ArrowType::Bidirectional {
        heads.push(head_at(points[1], points[0]));
    }
    heads.push(head_at(points[n - 2], points[n - 1]));
    heads
}

fn head_at(from: Point, tip: Point) -> Arrowhead {
    let d = tip - from;
    Arrowhead {
        tip,
        angle: d.y.atan2(d.x),
    }
}

/// Closed outline of a head of `size` (length along the line).
///
/// A triangle has its apex on the tip and its base corners `size` back at
/// ±30°. Circle and square heads sit just behind the tip.
pub fn arrowhead_path(head: Arrowhead, shape: ArrowHeadShape, size: f64) -> BezPath {
    let dir = head.direction();
    match shape {
        ArrowHeadShape::Triangle => {
            let left = head.tip - Vec2::from_angle(head.angle - FRAC_PI_6) * size;
            let right = head.tip - Vec2::from_angle(head.angle + FRAC_PI_6) * size;
            closed_polygon(&[head.tip, left, right])
        }
        ArrowHeadShape::Circle => {
            let radius = size / 2.0;
            Circle::new(head.tip - dir * radius, radius).to_path(0.1)
        }
        ArrowHeadShape::Square => {
            let half = size / 2.0;
            let center = head.tip - dir * half;
            let along = dir * half;
            let across = Vec2::new(-dir.y, dir.x) * half;
            closed_polygon(&[
                center + along + across,
                center + along - across,
                center - along - across,
                center - along + across,
            ])
        }
    }
}

/// Open straight-segment path through `points`.
pub fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
    }
    path
}

/// `points` are in frame units and hold at least two entries.
pub(super) fn draw_arrow<C: DrawContext + ?Sized>(
    ctx: &mut C,
    points: &[Point],
    data: &ArrowData,
    scale: f64,
) {
    ctx.stroke_path(&polyline(points));

    ctx.save();
    let color = ctx.state().stroke_color;
    ctx.set_fill_color(color);
    ctx.set_line_dash(&[]);
    for head in arrowhead_geometry(points, data.arrow_type) {
        ctx.fill_path(&arrowhead_path(head, data.head.shape, data.head.size * scale));
    }
    ctx.restore();
}

pub(super) fn draw_line<C: DrawContext + ?Sized>(ctx: &mut C, points: &[Point]) {
    ctx.stroke_path(&polyline(points));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawOp, RecordingContext};
    use std::f64::consts::PI;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn test_single_head_at_last_segment() {
        let points = [Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(50.0, 40.0)];
        let heads = arrowhead_geometry(&points, ArrowType::Line);
        assert_eq!(heads.len(), 1);
        assert!(close(heads[0].tip, Point::new(50.0, 40.0)));
        assert!((heads[0].angle - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bidirectional_heads_point_outward() {
        let points = [Point::new(10.0, 10.0), Point::new(110.0, 10.0)];
        let heads = arrowhead_geometry(&points, ArrowType::Bidirectional);
        assert_eq!(heads.len(), 2);

        for head in &heads {
            // The base of each triangle lies on the line side of the tip.
            let bbox = arrowhead_path(*head, ArrowHeadShape::Triangle, 10.0).bounding_box();
            let base_x = if close(head.tip, points[0]) { bbox.x1 } else { bbox.x0 };
            let midpoint = 60.0;
            assert!((base_x - midpoint).abs() < (head.tip.x - midpoint).abs());
        }
        assert!(close(heads[0].tip, points[0]));
        assert!((heads[0].angle.abs() - PI).abs() < 1e-12);
        assert!(close(heads[1].tip, points[1]));
        assert!(heads[1].angle.abs() < 1e-12);
    }

    #[test]
    fn test_triangle_geometry() {
        let head = Arrowhead {
            tip: Point::new(100.0, 0.0),
            angle: 0.0,
        };
        let path = arrowhead_path(head, ArrowHeadShape::Triangle, 15.0);
        let bbox = path.bounding_box();
        let back = 15.0 * FRAC_PI_6.cos();
        let spread = 15.0 * FRAC_PI_6.sin();
        assert!((bbox.x0 - (100.0 - back)).abs() < 1e-9);
        assert!((bbox.x1 - 100.0).abs() < 1e-9);
        assert!((bbox.y0 + spread).abs() < 1e-9);
        assert!((bbox.y1 - spread).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_points() {
        assert!(arrowhead_geometry(&[Point::ZERO], ArrowType::Bidirectional).is_empty());
        assert!(arrowhead_geometry(&[], ArrowType::Line).is_empty());
    }

    #[test]
    fn test_draw_arrow_fills_heads_with_stroke_color() {
        let mut ctx = RecordingContext::new(100, 100);
        let stroke = peniko::Color::from_rgba8(255, 0, 0, 255);
        ctx.set_stroke_color(stroke);
        ctx.set_line_dash(&[5.0, 5.0]);
        let data = ArrowData::new(vec![Point::ZERO, Point::new(40.0, 0.0)])
            .with_type(ArrowType::Bidirectional);
        let points = data.points.clone();
        draw_arrow(&mut ctx, &points, &data, 1.0);

        let ops = ctx.ops();
        assert_eq!(ops.len(), 3);
        assert!(matches!(&ops[0], DrawOp::Stroke { dash, .. } if dash == &vec![5.0, 5.0]));
        for op in &ops[1..] {
            assert!(matches!(op, DrawOp::Fill { color, .. } if *color == stroke));
        }
        assert_eq!(ctx.state().line_dash, vec![5.0, 5.0]);
    }
}
