//! Canvink Render Library
//!
//! Immediate-mode rendering for Canvink: a [`DrawContext`] abstraction with a
//! tiny-skia raster backend and a recording backend, per-element draw
//! routines, lazy image loading, overlays, and the [`Renderer`] pipeline that
//! ties them to a viewport.

pub mod config;
pub mod context;
pub mod draw;
pub mod images;
pub mod overlay;
pub mod recording;
mod renderer;
pub mod skia;

pub use config::{GridStyle, RenderConfig};
pub use context::{
    Bitmap, DrawContext, DrawState, Shadow, TextBaseline, apply_viewport, reset_viewport,
};
pub use draw::{DrawEnv, draw_element, element_frame, place_element};
pub use images::{FileFetcher, ImageFetcher, ImageLoadError, ImageLoader, ImageStatus};
pub use overlay::{Handle, HandleKind, HandleShape, selection_handles};
pub use recording::{DrawOp, RecordingContext};
pub use renderer::{
    RenderOutcome, RenderResult, RenderStats, Renderer, RendererError, SkipReason,
};
pub use skia::SkiaSurface;
