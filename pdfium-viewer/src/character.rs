//! Character position records shared with text consumers

use crate::geometry::RectF;
use serde::{Deserialize, Serialize};

/// One character on a page, as reported by a text extractor.
///
/// The rendering core never produces these; search and selection components
/// do, and read page geometry from [`crate::PdfDocument`] to place them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfCharacterInfo {
    /// Zero-based page index.
    pub page: usize,
    /// Offset of the character in the page's text.
    pub offset: usize,
    pub character: char,
    /// Font size in points.
    pub font_size: f64,
    /// Bounding box in page points.
    pub bounds: RectF,
}

impl PdfCharacterInfo {
    pub fn new(page: usize, offset: usize, character: char, font_size: f64, bounds: RectF) -> Self {
        Self {
            page,
            offset,
            character,
            font_size,
            bounds,
        }
    }

    /// Whitespace (space, tab, line break).
    pub fn is_whitespace(&self) -> bool {
        self.character.is_whitespace()
    }

    /// Whether the point (in page points) falls inside the character box.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.bounds.left && x < self.bounds.right && y >= self.bounds.top && y < self.bounds.bottom
    }
}
