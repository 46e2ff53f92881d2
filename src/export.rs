//! JSON export of word-level extraction results.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::text_box::TextBox;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// The words of one page, with enough context to place them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageWords {
    /// 0-based page index
    pub index: usize,
    pub label: String,
    /// Crop box width in points
    pub width: f64,
    /// Crop box height in points
    pub height: f64,
    pub words: Vec<TextBox>,
}

/// Collect the words of every selected page.
pub fn page_words(doc: &Document) -> Result<Vec<PageWords>> {
    doc.selected_indices()
        .into_iter()
        .map(|i| {
            let page = doc.page(i)?;
            let (width, height) = page.size();
            Ok(PageWords {
                index: i,
                label: page.label(),
                width,
                height,
                words: page.text_list()?,
            })
        })
        .collect()
}

/// Convert the words of every selected page to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let pages = page_words(doc)?;
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&pages),
        JsonFormat::Compact => serde_json::to_string(&pages),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
