//! Renderer configuration.

use crate::renderer::RendererError;
use canvink_core::SerializableColor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStyle {
    /// No grid.
    #[default]
    None,
    /// Full grid lines.
    Lines,
    /// Only corner crosses (+).
    Crosses,
    /// Only corner dots (.).
    Dots,
}

impl GridStyle {
    /// Cycle to the next grid style.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Lines,
            GridStyle::Lines => GridStyle::Crosses,
            GridStyle::Crosses => GridStyle::Dots,
            GridStyle::Dots => GridStyle::None,
        }
    }

    /// Display name for this grid style.
    pub fn name(self) -> &'static str {
        match self {
            GridStyle::None => "None",
            GridStyle::Lines => "Lines",
            GridStyle::Crosses => "Crosses",
            GridStyle::Dots => "Dots",
        }
    }
}

/// Colors, timing and preview styling used by the [`Renderer`](crate::Renderer).
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Fill applied after clearing; `None` keeps the surface transparent.
    pub background: Option<SerializableColor>,
    pub grid_style: GridStyle,
    /// Grid spacing in virtual units.
    pub grid_size: f64,
    pub grid_color: SerializableColor,
    pub selection_color: SerializableColor,
    /// Side of a square resize handle, in screen pixels.
    pub handle_size: f64,
    pub connection_point_color: SerializableColor,
    /// Radius of a connection point dot, in screen pixels.
    pub connection_point_radius: f64,
    pub connection_line_color: SerializableColor,
    pub guide_color: SerializableColor,
    /// Minimum time between two main renders.
    pub throttle_interval_ms: u64,
    /// Global alpha of the preview surface content.
    pub preview_alpha: f64,
    /// Stroke dash used for preview content.
    pub preview_dash: Vec<f64>,
    pub placeholder_fill: SerializableColor,
    pub placeholder_stroke: SerializableColor,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: None,
            grid_style: GridStyle::None,
            grid_size: 20.0,
            grid_color: SerializableColor::new(200, 200, 200, 100),
            selection_color: SerializableColor::rgb(59, 130, 246), // Blue
            handle_size: 8.0,
            connection_point_color: SerializableColor::rgb(59, 130, 246),
            connection_point_radius: 4.0,
            connection_line_color: SerializableColor::rgb(59, 130, 246),
            guide_color: SerializableColor::rgb(236, 72, 153), // Pink-500
            throttle_interval_ms: 16,
            preview_alpha: 0.7,
            preview_dash: vec![5.0, 5.0],
            placeholder_fill: SerializableColor::rgb(240, 240, 240),
            placeholder_stroke: SerializableColor::rgb(160, 160, 160),
        }
    }
}

impl RenderConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RendererError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    /// Set the background color.
    pub fn with_background(mut self, color: SerializableColor) -> Self {
        self.background = Some(color);
        self
    }

    /// Set the grid style and spacing.
    pub fn with_grid(mut self, style: GridStyle, size: f64) -> Self {
        self.grid_style = style;
        self.grid_size = size;
        self
    }

    pub fn with_selection_color(mut self, color: SerializableColor) -> Self {
        self.selection_color = color;
        self
    }

    pub fn with_guide_color(mut self, color: SerializableColor) -> Self {
        self.guide_color = color;
        self
    }

    /// Set the throttle interval; 0 disables throttling.
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set preview alpha and dash.
    pub fn with_preview_style(mut self, alpha: f64, dash: Vec<f64>) -> Self {
        self.preview_alpha = alpha;
        self.preview_dash = dash;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.throttle_interval(), Duration::from_millis(16));
        assert!((config.preview_alpha - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.preview_dash, vec![5.0, 5.0]);
        assert_eq!(config.guide_color, SerializableColor::rgb(236, 72, 153));
    }

    #[test]
    fn test_partial_json() {
        let config = RenderConfig::from_json(
            r#"{
                "grid_style": "dots",
                "throttle_interval_ms": 33,
                "background": {"r": 250, "g": 250, "b": 250, "a": 255}
            }"#,
        )
        .unwrap();
        assert_eq!(config.grid_style, GridStyle::Dots);
        assert_eq!(config.throttle_interval_ms, 33);
        assert_eq!(config.background, Some(SerializableColor::rgb(250, 250, 250)));
        assert!((config.handle_size - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            RenderConfig::from_json("{not json"),
            Err(RendererError::Config(_))
        ));
    }

    #[test]
    fn test_grid_style_cycle() {
        let mut style = GridStyle::None;
        for _ in 0..4 {
            style = style.next();
        }
        assert_eq!(style, GridStyle::None);
        assert_eq!(GridStyle::Crosses.name(), "Crosses");
    }
}
