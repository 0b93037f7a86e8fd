//! Text payload shared by text elements and shape labels.

use serde::{Deserialize, Serialize};

/// Horizontal alignment against the element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Line decoration drawn across the measured text width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    StrikeThrough,
}

fn default_line_height() -> f64 {
    1.2
}

/// Multi-line text content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// Text with `\n` separated lines.
    pub content: String,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub decoration: TextDecoration,
    /// Line advance as a multiple of the font size.
    #[serde(default = "default_line_height")]
    pub line_height: f64,
}

impl TextContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            align: TextAlign::default(),
            decoration: TextDecoration::default(),
            line_height: default_line_height(),
        }
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_decoration(mut self, decoration: TextDecoration) -> Self {
        self.decoration = decoration;
        self
    }

    /// Lines of the content; an empty string yields no lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n').filter(|_| !self.content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        let text = TextContent::new("one\ntwo\n\nfour");
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["one", "two", "", "four"]);
        assert_eq!(TextContent::new("").lines().count(), 0);
    }

    #[test]
    fn test_decoration_names() {
        let decoration: TextDecoration = serde_json::from_str("\"strike-through\"").unwrap();
        assert_eq!(decoration, TextDecoration::StrikeThrough);
    }
}
