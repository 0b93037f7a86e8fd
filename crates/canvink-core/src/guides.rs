//! Smart alignment guides.
//!
//! Guides are supplied by the editing layer each frame while an element is
//! dragged. Their position is already in screen coordinates.

use serde::{Deserialize, Serialize};

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideKind {
    /// Spans the full width at `y = position`.
    Horizontal,
    /// Spans the full height at `x = position`.
    Vertical,
}

/// An ephemeral alignment line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartGuide {
    pub kind: GuideKind,
    /// Screen coordinate (y for horizontal, x for vertical).
    pub position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SmartGuide {
    pub fn horizontal(position: f64) -> Self {
        Self {
            kind: GuideKind::Horizontal,
            position,
            label: None,
        }
    }

    pub fn vertical(position: f64) -> Self {
        Self {
            kind: GuideKind::Vertical,
            position,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
