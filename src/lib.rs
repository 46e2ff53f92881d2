//! # pdfpage
//!
//! Page-level access to PDF documents: page geometry, labels and
//! presentation transitions, word boxes, plain text in physical or raw
//! layout, and text search with match rectangles.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfpage::{CaseSensitivity, Document, Rect, Rotation, SearchDirection};
//!
//! fn main() -> pdfpage::Result<()> {
//!     let doc = Document::open("document.pdf")?;
//!     let page = doc.page(0)?;
//!
//!     println!("{} ({:?})", page.label(), page.orientation());
//!     println!("{}", page.text(None)?);
//!
//!     let mut hit = Rect::default();
//!     while page.search(
//!         "invoice",
//!         &mut hit,
//!         SearchDirection::NextResult,
//!         CaseSensitivity::CaseInsensitive,
//!         Rotation::Rotate0,
//!     )? {
//!         println!("found at {:?}", hit);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Coordinates
//!
//! [`Page::page_rect`] reports boxes in PDF user space. Everything derived
//! from page content (word and glyph boxes, search results, the clip
//! rectangle of [`Page::text`]) uses points from the top-left corner of
//! the crop box, y pointing down.

pub mod detect;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod options;
pub mod page;
pub mod text_box;
pub mod transition;

mod labels;
mod parser;
mod text;

// Re-export commonly used types
pub use detect::{is_pdf, is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use document::{Document, Metadata};
pub use error::{Error, Result};
pub use export::{JsonFormat, PageWords};
pub use geometry::{Matrix, Rect};
pub use options::{ErrorMode, LoadOptions, PageSelection};
pub use page::{
    CaseSensitivity, Orientation, Page, PageBox, Rotation, SearchDirection, TextLayout,
};
pub use text_box::TextBox;
pub use transition::{PageTransition, TransitionAlignment, TransitionDirection, TransitionType};

use std::path::Path;

/// Extract the text of every page of a PDF file, pages separated by form
/// feeds.
///
/// # Example
///
/// ```no_run
/// use pdfpage::{extract_text, TextLayout};
///
/// let text = extract_text("document.pdf", TextLayout::PhysicalLayout).unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P, layout: TextLayout) -> Result<String> {
    let doc = Document::open(path)?;
    Ok(doc.text(layout)?.join("\n\u{c}"))
}

/// Convert the words of a PDF file to JSON.
///
/// # Example
///
/// ```no_run
/// use pdfpage::{to_json, JsonFormat};
///
/// let json = to_json("document.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("words.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = Document::open(path)?;
    export::to_json(&doc, format)
}
