//! Point-list payloads: freehand paths, arrows and lines.
//!
//! All points are stored relative to the owning element's `position`.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Freehand path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathData {
    pub points: Vec<Point>,
}

/// Straight polyline without heads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineData {
    pub points: Vec<Point>,
}

/// Which ends of an arrow carry a head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowType {
    /// Head at the last point only.
    #[default]
    Line,
    /// Heads at both ends.
    Bidirectional,
}

/// Arrowhead outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowHeadShape {
    #[default]
    Triangle,
    Circle,
    Square,
}

fn default_head_size() -> f64 {
    15.0
}

/// Arrowhead description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowHead {
    #[serde(default)]
    pub shape: ArrowHeadShape,
    /// Head length in virtual units.
    #[serde(default = "default_head_size")]
    pub size: f64,
}

impl Default for ArrowHead {
    fn default() -> Self {
        Self {
            shape: ArrowHeadShape::default(),
            size: default_head_size(),
        }
    }
}

/// Arrow payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowData {
    pub points: Vec<Point>,
    #[serde(default)]
    pub arrow_type: ArrowType,
    #[serde(default)]
    pub head: ArrowHead,
}

impl ArrowData {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            arrow_type: ArrowType::default(),
            head: ArrowHead::default(),
        }
    }

    pub fn with_type(mut self, arrow_type: ArrowType) -> Self {
        self.arrow_type = arrow_type;
        self
    }

    pub fn with_head(mut self, shape: ArrowHeadShape, size: f64) -> Self {
        self.head = ArrowHead { shape, size };
        self
    }
}
