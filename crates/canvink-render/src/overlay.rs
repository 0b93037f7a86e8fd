//! Overlays drawn above content: grid, connection points, the connection
//! drag line, selection handles and smart guides.
//!
//! Apart from the grid, overlays are drawn at identity transform in screen
//! pixels so their size does not follow the zoom.

use crate::config::{GridStyle, RenderConfig};
use crate::context::{DrawContext, TextBaseline, apply_viewport, reset_viewport};
use crate::draw::{Arrowhead, arrowhead_path, element_frame, frame_points};
use canvink_core::{
    ArrowHeadShape, CanvasElement, ConnectionDragState, ConnectionPoint, CoordinateTransformer,
    ElementData, FontSpec, GuideKind, SmartGuide, TextAlign,
};
use kurbo::{BezPath, Circle, Point, Rect, Shape, Vec2};
use peniko::Color;

/// Distance between the top edge and the rotation handle, in pixels.
const ROTATION_HANDLE_OFFSET: f64 = 24.0;

/// Font size of guide labels, in pixels.
const GUIDE_LABEL_SIZE: f64 = 11.0;

/// Which handle of a selection this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    // Corner handles
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    // Edge handles
    Top,
    Bottom,
    Left,
    Right,
    // Endpoint handles (for lines, arrows)
    Start,
    End,
    // Rotation handle
    Rotate,
}

/// Visual shape of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleShape {
    #[default]
    Square,
    Circle,
}

/// A selection handle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    pub position: Point,
    pub shape: HandleShape,
}

impl Handle {
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self {
            kind,
            position,
            shape: HandleShape::default(),
        }
    }

    pub fn with_shape(mut self, shape: HandleShape) -> Self {
        self.shape = shape;
        self
    }
}

/// Handles of a selected element in screen coordinates.
///
/// Arrows and lines get circular endpoint handles; everything else gets
/// four corners, four edge midpoints and a rotation handle above the top
/// edge, all following the element rotation.
pub fn selection_handles(
    element: &CanvasElement,
    transformer: &CoordinateTransformer,
) -> Vec<Handle> {
    let frame = element_frame(element, transformer);
    let scale = transformer.scale();

    let endpoints = match &element.data {
        ElementData::Arrow(data) => Some(&data.points),
        ElementData::Line(data) => Some(&data.points),
        _ => None,
    };
    if let Some(points) = endpoints {
        let points = frame_points(points, scale);
        return match (points.first(), points.last()) {
            (Some(first), Some(last)) if points.len() >= 2 => vec![
                Handle::new(HandleKind::Start, frame * *first).with_shape(HandleShape::Circle),
                Handle::new(HandleKind::End, frame * *last).with_shape(HandleShape::Circle),
            ],
            _ => Vec::new(),
        };
    }

    let size = transformer.virtual_size_to_screen(element.size);
    let (w, h) = (size.width, size.height);
    let local = [
        (HandleKind::TopLeft, Point::new(0.0, 0.0)),
        (HandleKind::Top, Point::new(w / 2.0, 0.0)),
        (HandleKind::TopRight, Point::new(w, 0.0)),
        (HandleKind::Right, Point::new(w, h / 2.0)),
        (HandleKind::BottomRight, Point::new(w, h)),
        (HandleKind::Bottom, Point::new(w / 2.0, h)),
        (HandleKind::BottomLeft, Point::new(0.0, h)),
        (HandleKind::Left, Point::new(0.0, h / 2.0)),
        (HandleKind::Rotate, Point::new(w / 2.0, -ROTATION_HANDLE_OFFSET)),
    ];
    local
        .into_iter()
        .map(|(kind, p)| {
            let handle = Handle::new(kind, frame * p);
            if kind == HandleKind::Rotate {
                handle.with_shape(HandleShape::Circle)
            } else {
                handle
            }
        })
        .collect()
}

/// Selection outline plus handles for every selected element.
pub fn draw_selection<C: DrawContext + ?Sized>(
    ctx: &mut C,
    selected: &[&CanvasElement],
    transformer: &CoordinateTransformer,
    config: &RenderConfig,
) {
    let color: Color = config.selection_color.into();
    ctx.save();
    reset_viewport(ctx);
    ctx.set_global_alpha(1.0);
    ctx.set_line_dash(&[]);
    ctx.set_stroke_color(color);

    for element in selected {
        let handles = selection_handles(element, transformer);
        let is_linear = matches!(element.data, ElementData::Arrow(_) | ElementData::Line(_));
        if !is_linear {
            let size = transformer.virtual_size_to_screen(element.size);
            ctx.save();
            ctx.concat(element_frame(element, transformer));
            ctx.set_line_width(1.5);
            ctx.stroke_path(&Rect::from_origin_size(Point::ZERO, size).to_path(0.1));

            let mut stem = BezPath::new();
            stem.move_to((size.width / 2.0, 0.0));
            stem.line_to((size.width / 2.0, -ROTATION_HANDLE_OFFSET));
            ctx.stroke_path(&stem);
            ctx.restore();
        }
        for handle in &handles {
            draw_handle(ctx, handle, config.handle_size, color);
        }
    }
    ctx.restore();
}

fn draw_handle<C: DrawContext + ?Sized>(ctx: &mut C, handle: &Handle, size: f64, color: Color) {
    let half = size / 2.0;
    let path = match handle.shape {
        HandleShape::Square => Rect::new(
            handle.position.x - half,
            handle.position.y - half,
            handle.position.x + half,
            handle.position.y + half,
        )
        .to_path(0.1),
        HandleShape::Circle => Circle::new(handle.position, half).to_path(0.1),
    };
    ctx.set_fill_color(Color::from_rgba8(255, 255, 255, 255));
    ctx.fill_path(&path);
    ctx.set_stroke_color(color);
    ctx.set_line_width(2.0);
    ctx.stroke_path(&path);
}

/// Dots on the four connection points of the hovered element.
pub fn draw_connection_points<C: DrawContext + ?Sized>(
    ctx: &mut C,
    points: &[ConnectionPoint],
    transformer: &CoordinateTransformer,
    config: &RenderConfig,
) {
    if points.is_empty() {
        return;
    }
    ctx.save();
    reset_viewport(ctx);
    ctx.set_global_alpha(1.0);
    ctx.set_line_dash(&[]);
    ctx.set_fill_color(config.connection_point_color.into());
    ctx.set_stroke_color(Color::from_rgba8(255, 255, 255, 255));
    ctx.set_line_width(1.5);
    for point in points {
        let center = transformer.virtual_to_screen(point.point);
        let dot = Circle::new(center, config.connection_point_radius).to_path(0.1);
        ctx.fill_path(&dot);
        ctx.stroke_path(&dot);
    }
    ctx.restore();
}

/// Dashed line with a triangular head while a connection is being dragged.
pub fn draw_connection_drag<C: DrawContext + ?Sized>(
    ctx: &mut C,
    state: &ConnectionDragState,
    transformer: &CoordinateTransformer,
    config: &RenderConfig,
) {
    if !state.is_dragging {
        return;
    }
    let start = transformer.virtual_to_screen(state.start_point);
    let end = transformer.virtual_to_screen(state.end_point);
    let color: Color = config.connection_line_color.into();

    ctx.save();
    reset_viewport(ctx);
    ctx.set_global_alpha(1.0);
    ctx.set_stroke_color(color);
    ctx.set_fill_color(color);
    ctx.set_line_width(2.0);
    ctx.set_line_dash(&[5.0, 5.0]);
    let mut line = BezPath::new();
    line.move_to(start);
    line.line_to(end);
    ctx.stroke_path(&line);

    let d = end - start;
    if d.hypot() > f64::EPSILON {
        let head = Arrowhead {
            tip: end,
            angle: d.y.atan2(d.x),
        };
        ctx.set_line_dash(&[]);
        ctx.fill_path(&arrowhead_path(head, ArrowHeadShape::Triangle, 10.0));
    }
    ctx.restore();
}

/// Full-span guide lines with boxed labels.
pub fn draw_smart_guides<C: DrawContext + ?Sized>(
    ctx: &mut C,
    guides: &[SmartGuide],
    config: &RenderConfig,
) {
    if guides.is_empty() {
        return;
    }
    let (w, h) = (f64::from(ctx.width()), f64::from(ctx.height()));
    let color: Color = config.guide_color.into();

    ctx.save();
    reset_viewport(ctx);
    ctx.set_global_alpha(1.0);
    ctx.set_line_dash(&[]);
    ctx.set_line_width(1.0);
    ctx.set_stroke_color(color);
    ctx.set_font(FontSpec::new("sans-serif", GUIDE_LABEL_SIZE));
    ctx.set_text_align(TextAlign::Left);
    ctx.set_text_baseline(TextBaseline::Middle);

    for guide in guides {
        let mut line = BezPath::new();
        let label_anchor = match guide.kind {
            GuideKind::Horizontal => {
                line.move_to((0.0, guide.position));
                line.line_to((w, guide.position));
                Point::new(8.0, guide.position - 12.0)
            }
            GuideKind::Vertical => {
                line.move_to((guide.position, 0.0));
                line.line_to((guide.position, h));
                Point::new(guide.position + 8.0, 12.0)
            }
        };
        ctx.stroke_path(&line);

        if let Some(label) = guide.label.as_deref().filter(|l| !l.is_empty()) {
            let padding = Vec2::new(4.0, 3.0);
            let text_width = ctx.measure_text(label);
            let label_box = Rect::new(
                label_anchor.x - padding.x,
                label_anchor.y - GUIDE_LABEL_SIZE / 2.0 - padding.y,
                label_anchor.x + text_width + padding.x,
                label_anchor.y + GUIDE_LABEL_SIZE / 2.0 + padding.y,
            );
            ctx.set_fill_color(color);
            ctx.fill_path(&label_box.to_rounded_rect(3.0).to_path(0.1));
            ctx.set_fill_color(Color::from_rgba8(255, 255, 255, 255));
            ctx.fill_text(label, label_anchor);
        }
    }
    ctx.restore();
}

/// Background grid under the content, in virtual units.
pub fn draw_grid<C: DrawContext + ?Sized>(
    ctx: &mut C,
    transformer: &CoordinateTransformer,
    config: &RenderConfig,
) {
    let grid_size = config.grid_size;
    if config.grid_style == GridStyle::None || grid_size <= 0.0 {
        return;
    }
    let bounds = transformer.viewport_bounds();
    let start_x = (bounds.x0 / grid_size).floor() * grid_size;
    let start_y = (bounds.y0 / grid_size).floor() * grid_size;
    let end_x = (bounds.x1 / grid_size).ceil() * grid_size;
    let end_y = (bounds.y1 / grid_size).ceil() * grid_size;
    // Everything below is in virtual units; keep marks one pixel wide.
    let px = 1.0 / transformer.scale();

    let mut path = BezPath::new();
    match config.grid_style {
        GridStyle::None => return,
        GridStyle::Lines => {
            let mut x = start_x;
            while x <= end_x {
                path.move_to((x, start_y));
                path.line_to((x, end_y));
                x += grid_size;
            }
            let mut y = start_y;
            while y <= end_y {
                path.move_to((start_x, y));
                path.line_to((end_x, y));
                y += grid_size;
            }
        }
        GridStyle::Crosses => {
            let arm = 3.0 * px;
            for_each_intersection(start_x, start_y, end_x, end_y, grid_size, |x, y| {
                path.move_to((x - arm, y));
                path.line_to((x + arm, y));
                path.move_to((x, y - arm));
                path.line_to((x, y + arm));
            });
        }
        GridStyle::Dots => {
            let half = 1.5 * px;
            for_each_intersection(start_x, start_y, end_x, end_y, grid_size, |x, y| {
                path.move_to((x - half, y - half));
                path.line_to((x + half, y - half));
                path.line_to((x + half, y + half));
                path.line_to((x - half, y + half));
                path.close_path();
            });
        }
    }

    ctx.save();
    apply_viewport(ctx, transformer.viewport());
    ctx.set_global_alpha(1.0);
    ctx.set_line_dash(&[]);
    let color: Color = config.grid_color.into();
    if config.grid_style == GridStyle::Dots {
        ctx.set_fill_color(color);
        ctx.fill_path(&path);
    } else {
        ctx.set_stroke_color(color);
        ctx.set_line_width(px);
        ctx.stroke_path(&path);
    }
    ctx.restore();
}

fn for_each_intersection(
    start_x: f64,
    start_y: f64,
    end_x: f64,
    end_y: f64,
    step: f64,
    mut f: impl FnMut(f64, f64),
) {
    let mut x = start_x;
    while x <= end_x {
        let mut y = start_y;
        while y <= end_y {
            f(x, y);
            y += step;
        }
        x += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawOp, RecordingContext};
    use canvink_core::{ShapeKind, Viewport, connection_points};
    use kurbo::{Affine, Size};

    fn transformer(scale: f64, offset: (f64, f64)) -> CoordinateTransformer {
        CoordinateTransformer::new(
            Viewport::new(400, 300)
                .with_scale(scale)
                .with_offset(Vec2::new(offset.0, offset.1)),
        )
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn test_box_handles_follow_viewport() {
        let size = Size::new(100.0, 50.0);
        let element = CanvasElement::shape(ShapeKind::Rectangle, Point::new(10.0, 20.0), size);
        let handles = selection_handles(&element, &transformer(2.0, (5.0, 5.0)));
        assert_eq!(handles.len(), 9);

        let find = |kind| handles.iter().find(|h| h.kind == kind).unwrap().position;
        assert!(close(find(HandleKind::TopLeft), Point::new(25.0, 45.0)));
        assert!(close(find(HandleKind::BottomRight), Point::new(225.0, 145.0)));
        assert!(close(find(HandleKind::Right), Point::new(225.0, 95.0)));
        assert!(close(find(HandleKind::Rotate), Point::new(125.0, 45.0 - ROTATION_HANDLE_OFFSET)));
    }

    #[test]
    fn test_rotated_handles() {
        let size = Size::new(100.0, 100.0);
        let element =
            CanvasElement::shape(ShapeKind::Rectangle, Point::ZERO, size).with_rotation(90.0);
        let handles = selection_handles(&element, &transformer(1.0, (0.0, 0.0)));
        let top_left = handles.iter().find(|h| h.kind == HandleKind::TopLeft).unwrap();
        // Clockwise quarter turn about (50, 50) moves the top-left corner to the top-right.
        assert!((top_left.position - Point::new(100.0, 0.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_linear_elements_get_endpoint_handles() {
        let element = CanvasElement::arrow(
            vec![Point::new(0.0, 0.0), Point::new(20.0, 5.0), Point::new(40.0, 10.0)],
            Point::new(10.0, 10.0),
            Size::new(40.0, 10.0),
        );
        let handles = selection_handles(&element, &transformer(1.5, (0.0, 0.0)));
        assert_eq!(handles.len(), 2);
        assert!(close(handles[0].position, Point::new(15.0, 15.0)));
        assert!(close(handles[1].position, Point::new(75.0, 30.0)));
        assert!(handles.iter().all(|h| h.shape == HandleShape::Circle));
    }

    #[test]
    fn test_overlays_draw_in_screen_space() {
        let mut ctx = RecordingContext::new(400, 300);
        let t = transformer(3.0, (10.0, 10.0));
        apply_viewport(&mut ctx, t.viewport());

        let element =
            CanvasElement::shape(ShapeKind::Circle, Point::new(10.0, 10.0), Size::new(20.0, 20.0));
        let config = RenderConfig::default();
        draw_connection_points(&mut ctx, &connection_points(&element), &t, &config);

        for op in ctx.ops() {
            assert_eq!(op.transform(), Some(Affine::IDENTITY));
        }
        // Top midpoint (20, 10) -> (70, 40)
        let DrawOp::Fill { path, .. } = &ctx.ops()[0] else {
            panic!("expected dot fill");
        };
        assert!(close(path.bounding_box().center(), Point::new(70.0, 40.0)));
        assert_eq!(ctx.transform(), t.to_affine());
    }

    #[test]
    fn test_connection_drag_only_while_dragging() {
        let config = RenderConfig::default();
        let t = transformer(1.0, (0.0, 0.0));
        let mut ctx = RecordingContext::new(100, 100);
        draw_connection_drag(&mut ctx, &ConnectionDragState::idle(), &t, &config);
        assert!(ctx.ops().is_empty());

        let state = ConnectionDragState::dragging(Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        draw_connection_drag(&mut ctx, &state, &t, &config);
        assert!(matches!(ctx.ops()[0], DrawOp::Stroke { ref dash, .. } if dash == &vec![5.0, 5.0]));
        let DrawOp::Fill { path, .. } = &ctx.ops()[1] else {
            panic!("expected arrowhead");
        };
        assert!((path.bounding_box().x1 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_guides_span_surface_with_label() {
        let mut ctx = RecordingContext::new(300, 200);
        let guides = [
            SmartGuide::vertical(120.0).with_label("120"),
            SmartGuide::horizontal(40.0),
        ];
        draw_smart_guides(&mut ctx, &guides, &RenderConfig::default());

        let strokes: Vec<Rect> = ctx
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Stroke { path, .. } => Some(path.bounding_box()),
                _ => None,
            })
            .collect();
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0], Rect::new(120.0, 0.0, 120.0, 200.0));
        assert_eq!(strokes[1], Rect::new(0.0, 40.0, 300.0, 40.0));
        assert_eq!(ctx.texts().collect::<Vec<_>>(), vec!["120"]);
    }

    #[test]
    fn test_grid_uses_viewport_transform() {
        let config = RenderConfig::default().with_grid(GridStyle::Lines, 50.0);
        let t = transformer(2.0, (0.0, 0.0));
        let mut ctx = RecordingContext::new(400, 300);
        draw_grid(&mut ctx, &t, &config);

        assert_eq!(ctx.ops().len(), 1);
        let DrawOp::Stroke { transform, width, .. } = &ctx.ops()[0] else {
            panic!("expected grid stroke");
        };
        assert_eq!(*transform, t.to_affine());
        assert!((width - 0.5).abs() < 1e-12);
        assert_eq!(ctx.transform(), Affine::IDENTITY);

        let mut ctx = RecordingContext::new(400, 300);
        draw_grid(&mut ctx, &t, &RenderConfig::default());
        assert!(ctx.ops().is_empty());
    }
}
