//! Word-level text extraction results.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// One extracted word, with its bounding box and per-glyph boxes.
///
/// Produced by [`crate::Page::text_list`]. The glyph boxes are owned by the
/// text box; the number of glyphs may differ from the number of characters
/// in [`TextBox::text`] (ligatures, complex scripts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    text: String,
    bbox: Rect,
    char_boxes: Vec<Rect>,
    has_space_after: bool,
    font_name: String,
    font_size: f64,
    #[serde(skip)]
    pub(crate) dir: u8,
}

impl TextBox {
    pub(crate) fn new(
        text: String,
        char_boxes: Vec<Rect>,
        font_name: String,
        font_size: f64,
        dir: u8,
    ) -> Self {
        let bbox = char_boxes
            .iter()
            .skip(1)
            .fold(char_boxes.first().copied().unwrap_or_default(), |acc, r| {
                acc.union(r)
            });
        Self {
            text,
            bbox,
            char_boxes,
            has_space_after: false,
            font_name,
            font_size,
            dir,
        }
    }

    /// The word's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bounding box of the whole word.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// Bounding box of the `i`-th glyph.
    ///
    /// An index past the last glyph yields `Rect::default()` (all zero)
    /// rather than an error.
    pub fn char_bbox(&self, i: usize) -> Rect {
        self.char_boxes.get(i).copied().unwrap_or_default()
    }

    /// Number of glyph boxes.
    pub fn glyph_count(&self) -> usize {
        self.char_boxes.len()
    }

    /// Whether a space separates this word from the next one on the line.
    pub fn has_space_after(&self) -> bool {
        self.has_space_after
    }

    pub fn font_name(&self) -> &str {
        &self.font_name
    }

    /// Effective font size in points.
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub(crate) fn char_boxes(&self) -> &[Rect] {
        &self.char_boxes
    }

    pub(crate) fn set_space_after(&mut self, space: bool) {
        self.has_space_after = space;
    }
}
