//! Raster image payload.

use super::SerializableColor;
use serde::{Deserialize, Serialize};

/// Named outline an image can be clipped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipShape {
    Rectangle,
    Circle,
    Ellipse,
    Triangle,
    Diamond,
    Star,
    Pentagon,
    Hexagon,
    Heart,
}

/// Color filters applied when drawing the bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFilters {
    /// 0.0..=1.0
    #[serde(default)]
    pub grayscale: f64,
    /// 0.0..=1.0
    #[serde(default)]
    pub sepia: f64,
    /// Blur radius in screen pixels.
    #[serde(default)]
    pub blur: f64,
    /// 1.0 = unchanged.
    #[serde(default = "default_brightness")]
    pub brightness: f64,
}

fn default_brightness() -> f64 {
    1.0
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            grayscale: 0.0,
            sepia: 0.0,
            blur: 0.0,
            brightness: 1.0,
        }
    }
}

impl ImageFilters {
    /// Whether any filter changes the pixels.
    pub fn is_identity(&self) -> bool {
        self.grayscale <= 0.0
            && self.sepia <= 0.0
            && self.blur <= 0.0
            && (self.brightness - 1.0).abs() < f64::EPSILON
    }

    /// CSS `filter` string equivalent, `None` when no filter is active.
    pub fn to_css(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.grayscale > 0.0 {
            parts.push(format!("grayscale({}%)", (self.grayscale * 100.0).round()));
        }
        if self.sepia > 0.0 {
            parts.push(format!("sepia({}%)", (self.sepia * 100.0).round()));
        }
        if self.blur > 0.0 {
            parts.push(format!("blur({}px)", self.blur));
        }
        if (self.brightness - 1.0).abs() >= f64::EPSILON {
            parts.push(format!("brightness({}%)", (self.brightness * 100.0).round()));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Border around the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBorder {
    pub width: f64,
    pub color: SerializableColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
}

fn default_overlay_font_size() -> f64 {
    24.0
}

/// Caption drawn over the image at a percentage position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOverlay {
    pub text: String,
    /// Horizontal center of the caption, 0..=100 % of the width.
    pub x_percent: f64,
    /// Vertical center of the caption, 0..=100 % of the height.
    pub y_percent: f64,
    #[serde(default = "default_overlay_font_size")]
    pub font_size: f64,
    #[serde(default = "SerializableColor::white")]
    pub color: SerializableColor,
    #[serde(default)]
    pub shadow: bool,
}

/// Payload of an image element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// File path or `data:` URI of the bitmap.
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipShape>,
    /// Rounded-rect clip radius, used when no clip shape is set.
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default)]
    pub filters: ImageFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<ImageBorder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<ImageOverlay>,
}

impl ImageData {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            clip: None,
            corner_radius: 0.0,
            filters: ImageFilters::default(),
            border: None,
            overlay: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_css() {
        assert_eq!(ImageFilters::default().to_css(), None);
        assert!(ImageFilters::default().is_identity());

        let filters = ImageFilters {
            grayscale: 1.0,
            blur: 2.0,
            brightness: 1.5,
            ..ImageFilters::default()
        };
        assert_eq!(
            filters.to_css().as_deref(),
            Some("grayscale(100%) blur(2px) brightness(150%)")
        );
    }
}
