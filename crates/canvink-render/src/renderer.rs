//! Main render pipeline over a pair of surfaces.

use crate::config::RenderConfig;
use crate::context::{DrawContext, reset_viewport};
use crate::draw::{DrawEnv, draw_element};
use crate::images::ImageLoader;
use crate::overlay;
use crate::skia::SkiaSurface;
use canvink_core::{
    CanvasElement, ConnectionDragState, ConnectionPoint, CoordinateTransformer, SmartGuide,
    Viewport, connection_points,
};
use kurbo::{Rect, Shape};
use std::collections::HashSet;
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Invalid surface size {width}x{height}")]
    InvalidSurfaceSize { width: u32, height: u32 },
    #[error("Preview surface is {preview:?}, main surface is {main:?}")]
    SurfaceMismatch { main: (u32, u32), preview: (u32, u32) },
    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Why a frame was not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The previous frame is younger than the throttle interval.
    Throttled,
    /// Nothing was invalidated since the previous frame.
    Clean,
}

/// Result of one [`Renderer::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered { drawn: usize, culled: usize },
    Skipped(SkipReason),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }
}

/// Cumulative counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub elements_drawn: u64,
    pub elements_culled: u64,
}

/// Draws elements onto a main surface and uncommitted work onto a preview
/// surface stacked above it.
///
/// The two surfaces always have the same pixel size. The preview surface
/// never receives committed content, and the main surface never receives
/// preview content.
#[derive(Debug)]
pub struct Renderer<S: DrawContext> {
    main: S,
    preview: S,
    config: RenderConfig,
    viewport: Viewport,
    images: ImageLoader,

    preview_mode: bool,
    preview_elements: Vec<CanvasElement>,
    hovered: Vec<ConnectionPoint>,
    connection_drag: ConnectionDragState,
    guides: Vec<SmartGuide>,

    needs_full_render: bool,
    dirty: Vec<Rect>,
    last_render: Option<Instant>,
    stats: RenderStats,
}

impl Renderer<SkiaSurface> {
    /// Create a renderer over two tiny-skia surfaces of `width` x `height`.
    pub fn with_skia(width: u32, height: u32, config: RenderConfig) -> RenderResult<Self> {
        Self::new(SkiaSurface::new(width, height)?, SkiaSurface::new(width, height)?, config)
    }
}

impl<S: DrawContext> Renderer<S> {
    /// Create a renderer over `main` and `preview`.
    ///
    /// Fails when either surface is empty or the two differ in size.
    pub fn new(main: S, preview: S, config: RenderConfig) -> RenderResult<Self> {
        let (width, height) = (main.width(), main.height());
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidSurfaceSize { width, height });
        }
        if (preview.width(), preview.height()) != (width, height) {
            return Err(RendererError::SurfaceMismatch {
                main: (width, height),
                preview: (preview.width(), preview.height()),
            });
        }
        log::debug!("Renderer created at {width}x{height}");

        Ok(Self {
            main,
            preview,
            config,
            viewport: Viewport::new(width, height),
            images: ImageLoader::default(),
            preview_mode: false,
            preview_elements: Vec::new(),
            hovered: Vec::new(),
            connection_drag: ConnectionDragState::idle(),
            guides: Vec::new(),
            needs_full_render: true,
            dirty: Vec::new(),
            last_render: None,
            stats: RenderStats::default(),
        })
    }

    /// Replace the image loader (e.g. to fetch from another root).
    pub fn with_image_loader(mut self, images: ImageLoader) -> Self {
        self.images.cancel_all();
        self.images = images;
        self
    }

    pub fn main_surface(&self) -> &S {
        &self.main
    }

    pub fn preview_surface(&self) -> &S {
        &self.preview
    }

    pub fn images(&self) -> &ImageLoader {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageLoader {
        &mut self.images
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
        self.request_full_render();
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn is_preview_active(&self) -> bool {
        self.preview_mode
    }

    fn transformer(&self) -> CoordinateTransformer {
        CoordinateTransformer::new(self.viewport)
    }

    /// Adopt a new viewport. The surface size stays the renderer's own.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport.with_size(self.main.width(), self.main.height());
        self.request_full_render();
        if self.preview_mode {
            self.redraw_preview();
        }
    }

    pub fn request_full_render(&mut self) {
        self.needs_full_render = true;
    }

    /// Queue a virtual-space region for redraw.
    pub fn mark_dirty(&mut self, region: Rect) {
        self.dirty.push(region);
    }

    /// Resize both surfaces and the viewport.
    pub fn update_canvas_size(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.main.resize(width, height)?;
        self.preview.resize(width, height)?;
        self.viewport = self.viewport.with_size(width, height);
        log::debug!("Canvas resized to {width}x{height}");
        self.request_full_render();
        if self.preview_mode {
            self.redraw_preview();
        }
        Ok(())
    }

    /// Render a frame now.
    pub fn render(&mut self, elements: &[CanvasElement]) -> RenderOutcome {
        self.render_at(elements, Instant::now())
    }

    /// Render a frame with an explicit clock reading.
    ///
    /// Elements are drawn in slice order, so later elements are on top.
    pub fn render_at(&mut self, elements: &[CanvasElement], now: Instant) -> RenderOutcome {
        if self.images.poll() > 0 {
            self.request_full_render();
        }

        if self.guides.is_empty() {
            let interval = self.config.throttle_interval();
            let throttled = self
                .last_render
                .is_some_and(|last| now.saturating_duration_since(last) < interval);
            if throttled {
                return self.skip(SkipReason::Throttled);
            }
            if !self.needs_full_render && self.dirty.is_empty() {
                return self.skip(SkipReason::Clean);
            }
        }

        let transformer = self.transformer();
        let screen = Rect::new(
            0.0,
            0.0,
            f64::from(self.main.width()),
            f64::from(self.main.height()),
        );
        self.main.clear();
        self.main.save();
        reset_viewport(&mut self.main);
        if let Some(background) = self.config.background {
            self.main.set_fill_color(background.into());
            self.main.fill_path(&screen.to_path(0.1));
        }
        overlay::draw_grid(&mut self.main, &transformer, &self.config);

        let mut drawn = 0;
        let mut culled = 0;
        {
            let mut env = DrawEnv::new(transformer, &mut self.images, &self.config);
            for element in elements {
                let bounds = transformer.virtual_rect_to_screen(element.bounds());
                if !element.visible || !overlaps(bounds, screen) {
                    culled += 1;
                    continue;
                }
                draw_element(&mut self.main, element, &mut env);
                drawn += 1;
            }
        }
        self.main.restore();

        if self.preview_mode {
            self.redraw_preview();
        }

        // Bitmaps of elements that are gone are not kept around.
        let live: HashSet<_> = elements
            .iter()
            .chain(&self.preview_elements)
            .map(|element| element.id)
            .collect();
        self.images.retain(&live);

        overlay::draw_connection_points(&mut self.main, &self.hovered, &transformer, &self.config);
        overlay::draw_connection_drag(
            &mut self.main,
            &self.connection_drag,
            &transformer,
            &self.config,
        );
        overlay::draw_smart_guides(&mut self.main, &self.guides, &self.config);

        self.needs_full_render = false;
        self.dirty.clear();
        self.last_render = Some(now);
        self.stats.frames_rendered += 1;
        self.stats.elements_drawn += drawn as u64;
        self.stats.elements_culled += culled as u64;
        RenderOutcome::Rendered { drawn, culled }
    }

    fn skip(&mut self, reason: SkipReason) -> RenderOutcome {
        log::trace!("Frame skipped: {reason:?}");
        if !self.hovered.is_empty() {
            let transformer = self.transformer();
            overlay::draw_connection_points(
                &mut self.main,
                &self.hovered,
                &transformer,
                &self.config,
            );
        }
        self.stats.frames_skipped += 1;
        RenderOutcome::Skipped(reason)
    }

    /// Draw selection outlines and handles over the current frame.
    ///
    /// An external update (`is_internal_update == false`) also invalidates
    /// the content, so the next [`render`](Self::render) repaints it.
    pub fn render_overlay(&mut self, selected: &[&CanvasElement], is_internal_update: bool) {
        if !is_internal_update {
            self.request_full_render();
        }
        let transformer = self.transformer();
        overlay::draw_selection(&mut self.main, selected, &transformer, &self.config);
        // Guides stay topmost.
        overlay::draw_smart_guides(&mut self.main, &self.guides, &self.config);
    }

    /// Enter preview mode with an empty preview surface.
    pub fn start_preview(&mut self) {
        self.preview_mode = true;
        self.preview.clear();
    }

    /// Leave preview mode and drop the preview elements.
    pub fn end_preview(&mut self) {
        self.preview_mode = false;
        self.preview_elements.clear();
        self.preview.clear();
    }

    /// Replace the preview elements, redrawing at once when preview mode is on.
    pub fn set_preview_elements(&mut self, elements: Vec<CanvasElement>) {
        self.preview_elements = elements;
        if self.preview_mode {
            self.redraw_preview();
        }
    }

    fn redraw_preview(&mut self) {
        let transformer = CoordinateTransformer::new(self.viewport);
        self.preview.clear();
        self.preview.save();
        reset_viewport(&mut self.preview);
        self.preview.set_global_alpha(self.config.preview_alpha);

        let mut env = DrawEnv::new(transformer, &mut self.images, &self.config)
            .with_dash_override(&self.config.preview_dash);
        for element in self.preview_elements.iter().filter(|e| e.visible) {
            draw_element(&mut self.preview, element, &mut env);
        }
        self.preview.restore();
    }

    /// Show the connection points of `element`, or hide them.
    pub fn set_hovered_element(&mut self, element: Option<&CanvasElement>) {
        let points = element.map(|e| connection_points(e).to_vec()).unwrap_or_default();
        if points != self.hovered {
            self.hovered = points;
            self.request_full_render();
        }
    }

    pub fn set_connection_drag_state(&mut self, state: ConnectionDragState) {
        if state != self.connection_drag {
            self.connection_drag = state;
            self.request_full_render();
        }
    }

    /// Active guides force every render through the throttle and dirty gates.
    pub fn set_smart_guides(&mut self, guides: Vec<SmartGuide>) {
        self.guides = guides;
    }

    pub fn clear_smart_guides(&mut self) {
        if !self.guides.is_empty() {
            self.guides.clear();
            self.request_full_render();
        }
    }

    /// Tear down: pending image loads are discarded.
    pub fn destroy(mut self) {
        self.images.cancel_all();
        self.preview_elements.clear();
        log::debug!(
            "Renderer destroyed after {} frames ({} skipped)",
            self.stats.frames_rendered,
            self.stats.frames_skipped
        );
    }
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x1 >= b.x0 && a.x0 <= b.x1 && a.y1 >= b.y0 && a.y0 <= b.y1
}
