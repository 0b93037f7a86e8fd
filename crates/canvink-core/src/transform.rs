//! Virtual ↔ screen coordinate conversion.
//!
//! Every on-screen placement in the renderer goes through a
//! [`CoordinateTransformer`]; nothing caches screen positions on elements.

use crate::viewport::{MAX_SCALE, Viewport, clamp_scale};
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Pure conversions over a copy of a [`Viewport`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    viewport: Viewport,
}

impl CoordinateTransformer {
    /// Create a transformer for the given viewport.
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    /// The viewport this transformer was built from.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Current zoom level.
    pub fn scale(&self) -> f64 {
        self.viewport.scale()
    }

    /// Affine transform from virtual to screen coordinates.
    ///
    /// Equivalent to [`virtual_to_screen`](Self::virtual_to_screen) applied
    /// per point.
    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.viewport.offset()) * Affine::scale(self.viewport.scale())
    }

    /// Affine transform from screen to virtual coordinates.
    pub fn inverse_affine(&self) -> Affine {
        Affine::scale(1.0 / self.viewport.scale()) * Affine::translate(-self.viewport.offset())
    }

    /// Convert a virtual point to screen coordinates.
    pub fn virtual_to_screen(&self, point: Point) -> Point {
        let scale = self.viewport.scale();
        let offset = self.viewport.offset();
        Point::new(point.x * scale + offset.x, point.y * scale + offset.y)
    }

    /// Convert a screen point to virtual coordinates.
    pub fn screen_to_virtual(&self, point: Point) -> Point {
        let scale = self.viewport.scale();
        let offset = self.viewport.offset();
        Point::new((point.x - offset.x) / scale, (point.y - offset.y) / scale)
    }

    /// Convert a virtual length to screen pixels.
    pub fn virtual_distance_to_screen(&self, distance: f64) -> f64 {
        distance * self.viewport.scale()
    }

    /// Convert a screen length to virtual units.
    pub fn screen_distance_to_virtual(&self, distance: f64) -> f64 {
        distance / self.viewport.scale()
    }

    /// Convert a virtual size to screen pixels.
    pub fn virtual_size_to_screen(&self, size: Size) -> Size {
        size * self.viewport.scale()
    }

    /// Convert a screen size to virtual units.
    pub fn screen_size_to_virtual(&self, size: Size) -> Size {
        size / self.viewport.scale()
    }

    /// Project a virtual rectangle onto the screen.
    pub fn virtual_rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_points(
            self.virtual_to_screen(rect.origin()),
            self.virtual_to_screen(Point::new(rect.x1, rect.y1)),
        )
    }

    /// Map a screen rectangle back into virtual space.
    pub fn screen_rect_to_virtual(&self, rect: Rect) -> Rect {
        Rect::from_points(
            self.screen_to_virtual(rect.origin()),
            self.screen_to_virtual(Point::new(rect.x1, rect.y1)),
        )
    }

    /// Return a viewport with `new_scale` (clamped).
    ///
    /// When `center_point` (virtual) is given, the offset is adjusted so that
    /// the point keeps its screen position; otherwise only the scale changes.
    pub fn set_scale(&self, new_scale: f64, center_point: Option<Point>) -> Viewport {
        let scale = clamp_scale(new_scale);
        match center_point {
            Some(center) => {
                let anchor = self.virtual_to_screen(center);
                let offset = Vec2::new(anchor.x - center.x * scale, anchor.y - center.y * scale);
                self.viewport.with_scale(scale).with_offset(offset)
            }
            None => self.viewport.with_scale(scale),
        }
    }

    /// The virtual rectangle currently visible on the surface.
    pub fn viewport_bounds(&self) -> Rect {
        let origin = self.screen_to_virtual(Point::ZERO);
        let size = self.screen_size_to_virtual(self.viewport.size());
        Rect::from_origin_size(origin, size)
    }

    /// Whether a virtual point is inside the visible area.
    pub fn is_visible(&self, point: Point) -> bool {
        let screen = self.virtual_to_screen(point);
        let size = self.viewport.size();
        screen.x >= 0.0 && screen.y >= 0.0 && screen.x <= size.width && screen.y <= size.height
    }

    /// Return a viewport that shows `bounds` centered with `padding` pixels
    /// of margin on each side ("zoom to fit").
    ///
    /// An axis with zero extent places no limit on the scale. Bounds that are
    /// a single point (or not finite) leave the viewport unchanged.
    pub fn fit_to_viewport(&self, bounds: Rect, padding: f64) -> Viewport {
        let size = self.viewport.size();
        let available = Size::new(
            (size.width - padding * 2.0).max(1.0),
            (size.height - padding * 2.0).max(1.0),
        );
        let axis_scale = |available: f64, extent: f64| {
            if extent > 0.0 { available / extent } else { f64::INFINITY }
        };
        let fit = axis_scale(available.width, bounds.width())
            .min(axis_scale(available.height, bounds.height()));
        if !fit.is_finite() || !bounds.center().is_finite() {
            return self.viewport;
        }
        let scale = clamp_scale(fit.min(MAX_SCALE));

        let center = bounds.center();
        let offset = Vec2::new(
            size.width / 2.0 - center.x * scale,
            size.height / 2.0 - center.y * scale,
        );
        self.viewport.with_scale(scale).with_offset(offset)
    }
}

impl From<Viewport> for CoordinateTransformer {
    fn from(viewport: Viewport) -> Self {
        Self::new(viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::MIN_SCALE;

    fn viewport(scale: f64, offset: (f64, f64)) -> Viewport {
        Viewport::new(800, 600)
            .with_scale(scale)
            .with_offset(Vec2::new(offset.0, offset.1))
    }

    fn assert_point_close(actual: Point, expected: Point, eps: f64) {
        assert!(
            (actual.x - expected.x).abs() < eps && (actual.y - expected.y).abs() < eps,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_virtual_to_screen_example() {
        let transformer = CoordinateTransformer::new(viewport(1.5, (100.0, 50.0)));
        let screen = transformer.virtual_to_screen(Point::new(200.0, 150.0));
        assert_point_close(screen, Point::new(400.0, 275.0), 1e-10);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let scales = [MIN_SCALE, 0.37, 1.0, 2.5, MAX_SCALE];
        let offsets = [(0.0, 0.0), (120.0, -48.0), (-3000.5, 912.25)];
        let points = [
            Point::new(-250.0, -100.0),
            Point::ZERO,
            Point::new(13.5, 92.25),
            Point::new(1.0e6, -64.0),
        ];
        for scale in scales {
            for offset in offsets {
                let transformer = CoordinateTransformer::new(viewport(scale, offset));
                for p in points {
                    let back = transformer.screen_to_virtual(transformer.virtual_to_screen(p));
                    assert_point_close(back, p, 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_affine_matches_manual_math() {
        let transformer = CoordinateTransformer::new(viewport(2.75, (120.0, -48.0)));
        let p = Point::new(37.0, -12.5);
        assert_point_close(transformer.to_affine() * p, transformer.virtual_to_screen(p), 1e-9);

        let s = Point::new(400.0, 300.0);
        assert_point_close(
            transformer.inverse_affine() * s,
            transformer.screen_to_virtual(s),
            1e-9,
        );
    }

    #[test]
    fn test_distance_conversion() {
        let transformer = CoordinateTransformer::new(viewport(2.0, (5.0, 5.0)));
        assert!((transformer.virtual_distance_to_screen(10.0) - 20.0).abs() < f64::EPSILON);
        assert!((transformer.screen_distance_to_virtual(10.0) - 5.0).abs() < f64::EPSILON);
        assert_eq!(
            transformer.virtual_size_to_screen(Size::new(3.0, 4.0)),
            Size::new(6.0, 8.0)
        );
    }

    #[test]
    fn test_anchored_zoom_example() {
        let transformer = CoordinateTransformer::new(viewport(1.0, (0.0, 0.0)));
        let zoomed = transformer.set_scale(2.0, Some(Point::new(50.0, 50.0)));
        assert!((zoomed.scale() - 2.0).abs() < f64::EPSILON);
        assert_eq!(zoomed.offset(), Vec2::new(-50.0, -50.0));
    }

    #[test]
    fn test_anchored_zoom_keeps_center_fixed() {
        let center = Point::new(-37.5, 812.0);
        for start in [0.1, 0.8, 1.0, 3.3, 5.0] {
            for target in [0.1, 0.25, 1.7, 4.9, 5.0] {
                let before = CoordinateTransformer::new(viewport(start, (73.0, -19.0)));
                let after = CoordinateTransformer::new(before.set_scale(target, Some(center)));
                assert_point_close(
                    after.virtual_to_screen(center),
                    before.virtual_to_screen(center),
                    1e-6,
                );
            }
        }
    }

    #[test]
    fn test_set_scale_without_center_keeps_offset() {
        let transformer = CoordinateTransformer::new(viewport(1.0, (10.0, 20.0)));
        let zoomed = transformer.set_scale(50.0, None);
        assert!((zoomed.scale() - MAX_SCALE).abs() < f64::EPSILON);
        assert_eq!(zoomed.offset(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_viewport_bounds() {
        let transformer = CoordinateTransformer::new(viewport(2.0, (-100.0, -50.0)));
        let bounds = transformer.viewport_bounds();
        assert_point_close(bounds.origin(), Point::new(50.0, 25.0), 1e-10);
        assert!((bounds.width() - 400.0).abs() < 1e-10);
        assert!((bounds.height() - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_fit_to_viewport_centers_bounds() {
        let transformer = CoordinateTransformer::new(viewport(1.0, (0.0, 0.0)));
        let bounds = Rect::new(100.0, 100.0, 300.0, 200.0);
        let fitted = CoordinateTransformer::new(transformer.fit_to_viewport(bounds, 50.0));

        // 700 / 200 = 3.5, 500 / 100 = 5.0
        assert!((fitted.scale() - 3.5).abs() < 1e-10);
        assert_point_close(
            fitted.virtual_to_screen(bounds.center()),
            Point::new(400.0, 300.0),
            1e-9,
        );
    }

    #[test]
    fn test_fit_to_viewport_clamps() {
        let transformer = CoordinateTransformer::new(viewport(1.0, (0.0, 0.0)));
        let tiny = transformer.fit_to_viewport(Rect::new(0.0, 0.0, 1.0, 1.0), 0.0);
        assert!((tiny.scale() - MAX_SCALE).abs() < f64::EPSILON);

        let huge = transformer.fit_to_viewport(Rect::new(0.0, 0.0, 1.0e7, 1.0e7), 0.0);
        assert!((huge.scale() - MIN_SCALE).abs() < f64::EPSILON);

        let unchanged = transformer.fit_to_viewport(Rect::new(5.0, 5.0, 5.0, 5.0), 10.0);
        assert_eq!(unchanged, transformer.viewport());
    }

    #[test]
    fn test_fit_to_viewport_segment_uses_nonzero_axis() {
        let transformer = CoordinateTransformer::new(viewport(1.0, (0.0, 0.0)));
        let bounds = Rect::new(100.0, 0.0, 100.0, 1000.0);
        let fitted = CoordinateTransformer::new(transformer.fit_to_viewport(bounds, 50.0));

        // Only the height limits: 500 / 1000
        assert!((fitted.scale() - 0.5).abs() < 1e-10);
        assert_point_close(
            fitted.virtual_to_screen(bounds.center()),
            Point::new(400.0, 300.0),
            1e-9,
        );

        let horizontal = transformer.fit_to_viewport(Rect::new(0.0, 40.0, 1400.0, 40.0), 50.0);
        assert!((horizontal.scale() - 0.5).abs() < 1e-10);
    }
}
