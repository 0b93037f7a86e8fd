//! Geometric shape payload.

use super::text::TextContent;
use serde::{Deserialize, Serialize};

/// Outline drawn by a shape element inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Diamond,
    Ellipse,
    Star,
}

/// Payload of a shape element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeData {
    pub kind: ShapeKind,
    /// Corner radius for rectangles (virtual units, 0 = sharp).
    #[serde(default)]
    pub corner_radius: f64,
    /// Label drawn inside the shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

impl ShapeData {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            corner_radius: 0.0,
            text: None,
        }
    }

    pub fn with_corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn with_text(mut self, text: TextContent) -> Self {
        self.text = Some(text);
        self
    }
}
