//! Canvas element definitions.
//!
//! Elements are owned by the editing layer and handed to the renderer by
//! reference each frame. Position and size are always virtual; screen
//! placement is recomputed from the current viewport on every render.

mod image;
mod linear;
mod shape;
mod text;

pub use image::{ClipShape, ImageBorder, ImageData, ImageFilters, ImageOverlay};
pub use linear::{ArrowData, ArrowHead, ArrowHeadShape, ArrowType, LineData, PathData};
pub use shape::{ShapeData, ShapeKind};
pub use text::{TextAlign, TextContent, TextDecoration};

use kurbo::{Point, Rect, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Identifier of the layer an element belongs to.
pub type LayerId = String;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Font description used by text-bearing elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Family name, e.g. "Roboto".
    pub family: String,
    /// Size in virtual units.
    pub size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            bold: false,
            italic: false,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("sans-serif", 16.0)
    }
}

/// Optional drawing properties.
///
/// A `None` field means "leave the drawing context alone": whatever value
/// was last set on the context stays in effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    /// 0.0 = fully transparent, 1.0 = fully opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontSpec>,
    /// Dash pattern in virtual units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_dash: Option<Vec<f64>>,
}

impl ElementStyle {
    pub fn with_fill(mut self, color: SerializableColor) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_stroke(mut self, color: SerializableColor, width: f64) -> Self {
        self.stroke = Some(color);
        self.stroke_width = Some(width);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_font(mut self, font: FontSpec) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_line_dash(mut self, dash: Vec<f64>) -> Self {
        self.line_dash = Some(dash);
        self
    }
}

/// Element type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Shape,
    Text,
    Path,
    Image,
    Arrow,
    Line,
}

/// Type-specific payload, tagged by element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ElementData {
    Shape(ShapeData),
    Text(TextContent),
    Path(PathData),
    Image(ImageData),
    Arrow(ArrowData),
    Line(LineData),
}

impl ElementData {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementData::Shape(_) => ElementKind::Shape,
            ElementData::Text(_) => ElementKind::Text,
            ElementData::Path(_) => ElementKind::Path,
            ElementData::Image(_) => ElementKind::Image,
            ElementData::Arrow(_) => ElementKind::Arrow,
            ElementData::Line(_) => ElementKind::Line,
        }
    }

    /// Relative point list for path/arrow/line payloads.
    pub fn points(&self) -> Option<&[Point]> {
        match self {
            ElementData::Path(p) => Some(&p.points),
            ElementData::Arrow(a) => Some(&a.points),
            ElementData::Line(l) => Some(&l.points),
            _ => None,
        }
    }
}

/// A drawable element on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    pub id: ElementId,
    /// Top-left corner before rotation (virtual).
    pub position: Point,
    /// Size in virtual units.
    pub size: Size,
    /// Rotation in degrees, clockwise, about the element center.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub style: ElementStyle,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub layer: LayerId,
    #[serde(flatten)]
    pub data: ElementData,
}

fn default_visible() -> bool {
    true
}

impl CanvasElement {
    /// Create a visible, unrotated element with a fresh id.
    pub fn new(data: ElementData, position: Point, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            size,
            rotation: 0.0,
            style: ElementStyle::default(),
            visible: true,
            layer: LayerId::new(),
            data,
        }
    }

    pub fn shape(kind: ShapeKind, position: Point, size: Size) -> Self {
        Self::new(ElementData::Shape(ShapeData::new(kind)), position, size)
    }

    pub fn text(content: impl Into<String>, position: Point, size: Size) -> Self {
        Self::new(ElementData::Text(TextContent::new(content)), position, size)
    }

    pub fn path(points: Vec<Point>, position: Point, size: Size) -> Self {
        Self::new(ElementData::Path(PathData { points }), position, size)
    }

    pub fn image(src: impl Into<String>, position: Point, size: Size) -> Self {
        Self::new(ElementData::Image(ImageData::new(src)), position, size)
    }

    pub fn arrow(points: Vec<Point>, position: Point, size: Size) -> Self {
        Self::new(ElementData::Arrow(ArrowData::new(points)), position, size)
    }

    pub fn line(points: Vec<Point>, position: Point, size: Size) -> Self {
        Self::new(ElementData::Line(LineData { points }), position, size)
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_layer(mut self, layer: impl Into<LayerId>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    /// Unrotated bounding box in virtual coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Rotation pivot in virtual coordinates.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Rotation in radians.
    pub fn rotation_radians(&self) -> f64 {
        self.rotation.to_radians()
    }

    /// Point data converted from position-relative to absolute virtual
    /// coordinates.
    pub fn absolute_points(&self) -> Vec<Point> {
        self.data
            .points()
            .map(|points| {
                points
                    .iter()
                    .map(|p| self.position + p.to_vec2())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_payload() {
        let element = CanvasElement::shape(
            ShapeKind::Star,
            Point::new(0.0, 0.0),
            Size::new(10.0, 10.0),
        );
        assert_eq!(element.kind(), ElementKind::Shape);

        let points = vec![Point::ZERO, Point::new(5.0, 5.0)];
        let element = CanvasElement::arrow(points, Point::ZERO, Size::new(5.0, 5.0));
        assert_eq!(element.kind(), ElementKind::Arrow);
        assert_eq!(element.data.points().map(<[Point]>::len), Some(2));
    }

    #[test]
    fn test_absolute_points_are_relative_to_position() {
        let element = CanvasElement::line(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 20.0)],
            Point::new(100.0, 50.0),
            Size::new(10.0, 20.0),
        );
        assert_eq!(
            element.absolute_points(),
            vec![Point::new(100.0, 50.0), Point::new(110.0, 70.0)]
        );
    }

    #[test]
    fn test_center_and_bounds() {
        let element = CanvasElement::text("hi", Point::new(10.0, 20.0), Size::new(100.0, 40.0));
        assert_eq!(element.center(), Point::new(60.0, 40.0));
        assert_eq!(element.bounds(), Rect::new(10.0, 20.0, 110.0, 60.0));
    }

    #[test]
    fn test_json_uses_type_and_data_tags() {
        let json = r#"{
            "id": "6f1b0a52-5a43-4f6f-9a0e-0a4a6b2f1c11",
            "position": {"x": 1.0, "y": 2.0},
            "size": {"width": 30.0, "height": 40.0},
            "rotation": 45.0,
            "style": {"stroke": {"r": 255, "g": 0, "b": 0, "a": 255}},
            "type": "arrow",
            "data": {
                "points": [{"x": 0.0, "y": 0.0}, {"x": 30.0, "y": 40.0}],
                "arrow_type": "bidirectional"
            }
        }"#;
        let element: CanvasElement = serde_json::from_str(json).unwrap();
        assert_eq!(element.kind(), ElementKind::Arrow);
        assert!(element.visible);
        assert!(element.style.fill.is_none());
        assert_eq!(element.style.stroke, Some(SerializableColor::rgb(255, 0, 0)));
        match element.data {
            ElementData::Arrow(arrow) => {
                assert_eq!(arrow.arrow_type, ArrowType::Bidirectional);
                assert_eq!(arrow.head.shape, ArrowHeadShape::Triangle);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_color_conversion_roundtrip() {
        let color = SerializableColor::new(12, 34, 56, 78);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
    }
}
