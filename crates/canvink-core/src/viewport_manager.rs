//! Viewport ownership, pan/zoom gestures and change notification.

use crate::transform::CoordinateTransformer;
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};

/// Listener invoked with a copy of the viewport after every change.
pub type ViewportListener = Box<dyn FnMut(Viewport)>;

/// A fixed-size world `[0, extent]` that panning may not leave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanBounds {
    /// Far corner of the world in virtual units.
    pub extent: Size,
}

impl PanBounds {
    /// Create bounds for a world of the given virtual size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            extent: Size::new(width, height),
        }
    }
}

/// In-progress pan gesture.
#[derive(Debug, Clone, Copy)]
struct PanGesture {
    /// Pointer position when the gesture started (screen).
    start: Point,
    /// Viewport offset when the gesture started.
    baseline_offset: Vec2,
}

/// Owns the single mutable [`Viewport`].
///
/// All math is delegated to [`CoordinateTransformer`]; this type only adds
/// gesture state, optional pan bounds and listener notification.
pub struct ViewportManager {
    viewport: Viewport,
    pan: Option<PanGesture>,
    bounds: Option<PanBounds>,
    listeners: Vec<ViewportListener>,
}

impl std::fmt::Debug for ViewportManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportManager")
            .field("viewport", &self.viewport)
            .field("pan", &self.pan)
            .field("bounds", &self.bounds)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ViewportManager {
    /// Create a manager around an initial viewport.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            pan: None,
            bounds: None,
            listeners: Vec::new(),
        }
    }

    /// Create a manager whose panning is confined to `bounds`.
    pub fn bounded(viewport: Viewport, bounds: PanBounds) -> Self {
        let mut manager = Self::new(viewport);
        manager.bounds = Some(bounds);
        manager
    }

    /// A copy of the current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Transformer over the current viewport.
    pub fn transformer(&self) -> CoordinateTransformer {
        CoordinateTransformer::new(self.viewport)
    }

    /// Register a change listener.
    pub fn on_viewport_change(&mut self, listener: impl FnMut(Viewport) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Set or remove pan bounds. The current viewport is clamped immediately.
    pub fn set_bounds(&mut self, bounds: Option<PanBounds>) {
        self.bounds = bounds;
        if bounds.is_some() {
            let offset = self.clamp_offset(self.viewport.offset());
            self.commit(self.viewport.with_offset(offset));
        }
    }

    /// Current pan bounds, if any.
    pub fn bounds(&self) -> Option<PanBounds> {
        self.bounds
    }

    /// Whether a pan gesture is in progress.
    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Begin a pan gesture at a screen position.
    pub fn start_pan(&mut self, screen_point: Point) {
        self.pan = Some(PanGesture {
            start: screen_point,
            baseline_offset: self.viewport.offset(),
        });
    }

    /// Continue the pan gesture.
    ///
    /// The visible virtual origin moves by `-delta / scale` relative to the
    /// baseline, so the world tracks the pointer 1:1 at any zoom. Returns
    /// `false` when there is no gesture or the update was refused by the
    /// pan bounds.
    pub fn update_pan(&mut self, screen_point: Point) -> bool {
        let Some(gesture) = self.pan else {
            return false;
        };
        let delta = screen_point - gesture.start;
        self.apply_pan_offset(gesture.baseline_offset + delta)
    }

    /// Finish the pan gesture.
    pub fn end_pan(&mut self) {
        self.pan = None;
    }

    /// Pan immediately by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        self.apply_pan_offset(self.viewport.offset() + delta)
    }

    /// Zoom to `scale`, optionally anchored at a virtual point.
    pub fn zoom(&mut self, scale: f64, center_point: Option<Point>) {
        let mut next = self.transformer().set_scale(scale, center_point);
        if self.bounds.is_some() {
            next = next.with_offset(self.clamp_offset_for(next, next.offset()));
        }
        self.commit(next);
    }

    /// Multiply the zoom by `factor`, keeping `screen_point` fixed.
    pub fn zoom_at_screen(&mut self, factor: f64, screen_point: Point) {
        let anchor = self.transformer().screen_to_virtual(screen_point);
        self.zoom(self.viewport.scale() * factor, Some(anchor));
    }

    /// Zoom and pan so that `bounds` fills the view with `padding` pixels of
    /// margin.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) {
        let next = self.transformer().fit_to_viewport(bounds, padding);
        self.commit(next);
    }

    /// Update the surface size in pixels.
    pub fn set_size(&mut self, width: u32, height: u32) {
        let next = self.viewport.with_size(width, height);
        self.commit(next);
    }

    /// Replace the viewport wholesale (scale is clamped by construction).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.commit(viewport);
    }

    /// Back to scale 1 with no pan.
    pub fn reset(&mut self) {
        let next = self.viewport.with_scale(1.0).with_offset(Vec2::ZERO);
        self.commit(next);
    }

    fn apply_pan_offset(&mut self, candidate: Vec2) -> bool {
        let offset = match self.bounds {
            Some(bounds) => match self.bounded_offset(bounds, candidate) {
                Some(offset) => offset,
                None => {
                    log::trace!("pan refused at world boundary");
                    return false;
                }
            },
            None => candidate,
        };
        if offset == self.viewport.offset() {
            return false;
        }
        self.commit(self.viewport.with_offset(offset));
        true
    }

    /// Clamp a candidate offset against the bounds, refusing movement past a
    /// far edge that is already on screen. `None` means nothing may move.
    fn bounded_offset(&self, bounds: PanBounds, candidate: Vec2) -> Option<Vec2> {
        let visible = self.transformer().viewport_bounds();
        let current = self.viewport.offset();
        let mut next = self.clamp_offset(candidate);

        // Moving the virtual origin right/down means a smaller offset.
        if visible.x1 >= bounds.extent.width && next.x < current.x {
            next.x = current.x;
        }
        if visible.y1 >= bounds.extent.height && next.y < current.y {
            next.y = current.y;
        }

        (next != current).then_some(next)
    }

    fn clamp_offset(&self, offset: Vec2) -> Vec2 {
        self.clamp_offset_for(self.viewport, offset)
    }

    fn clamp_offset_for(&self, viewport: Viewport, offset: Vec2) -> Vec2 {
        let Some(bounds) = self.bounds else {
            return offset;
        };
        let scale = viewport.scale();
        let visible = viewport.size() / scale;
        let max_x = (bounds.extent.width - visible.width).max(0.0);
        let max_y = (bounds.extent.height - visible.height).max(0.0);

        // Virtual origin is -offset / scale.
        let origin_x = (-offset.x / scale).clamp(0.0, max_x);
        let origin_y = (-offset.y / scale).clamp(0.0, max_y);
        Vec2::new(-origin_x * scale, -origin_y * scale)
    }

    fn commit(&mut self, next: Viewport) {
        if next == self.viewport {
            return;
        }
        self.viewport = next;
        for listener in &mut self.listeners {
            listener(next);
        }
    }
}
