//! Canvink Core Library
//!
//! Platform-agnostic viewport model, coordinate transforms and element
//! definitions for the Canvink canvas editor.

pub mod connection;
pub mod elements;
pub mod guides;
pub mod transform;
pub mod viewport;
pub mod viewport_manager;

pub use connection::{ConnectionDragState, ConnectionPoint, ConnectionSide, connection_points};
pub use elements::{
    ArrowData, ArrowHead, ArrowHeadShape, ArrowType, CanvasElement, ClipShape, ElementData,
    ElementId, ElementKind, ElementStyle, FontSpec, ImageBorder, ImageData, ImageFilters,
    ImageOverlay, LayerId, LineData, PathData, SerializableColor, ShapeData, ShapeKind, TextAlign,
    TextContent, TextDecoration,
};
pub use guides::{GuideKind, SmartGuide};
pub use transform::CoordinateTransformer;
pub use viewport::{MAX_SCALE, MIN_SCALE, Viewport};
pub use viewport_manager::{PanBounds, ViewportManager};
