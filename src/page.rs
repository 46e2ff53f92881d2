//! Page handles and page-level text access.

use lopdf::{Dictionary, ObjectId};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Result;
use crate::geometry::{Matrix, Rect};
use crate::parser::{dict_get, inherited, number, pdf_rect, resolve_dict, Glyph, TextInterpreter};
use crate::text::{build_words, find_all, into_lines, physical_text, raw_text, select, TextMatch};
use crate::text_box::TextBox;
use crate::transition::PageTransition;

/// US Letter, used when a page has no usable `/MediaBox`.
const DEFAULT_MEDIA_BOX: Rect = Rect::new(0.0, 0.0, 612.0, 792.0);

/// Page orientation, derived from the page rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Rotated 90 degrees clockwise
    Landscape,
    /// Not rotated
    Portrait,
    /// Rotated 270 degrees clockwise
    Seascape,
    /// Rotated 180 degrees
    UpsideDown,
}

/// The page boxes a PDF page can define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageBox {
    MediaBox,
    #[default]
    CropBox,
    BleedBox,
    TrimBox,
    ArtBox,
}

/// Where a search starts relative to the rectangle passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchDirection {
    /// First match on the page; the rectangle is ignored
    #[default]
    FromTop,
    /// First match after the rectangle
    NextResult,
    /// Last match before the rectangle
    PreviousResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseSensitivity {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

/// Rotation of the coordinate space search results are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Transform from unrotated page space (`width` x `height`) into the
    /// rotated space.
    fn matrix(self, width: f64, height: f64) -> Matrix {
        match self {
            Rotation::Rotate0 => Matrix::IDENTITY,
            Rotation::Rotate90 => Matrix::new(0.0, 1.0, -1.0, 0.0, height, 0.0),
            Rotation::Rotate180 => Matrix::new(-1.0, 0.0, 0.0, -1.0, width, height),
            Rotation::Rotate270 => Matrix::new(0.0, -1.0, 1.0, 0.0, 0.0, width),
        }
    }
}

/// Layout used when turning a page into plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextLayout {
    /// Reading order with horizontal positions kept as columns
    #[default]
    PhysicalLayout,
    /// Content-stream order
    RawOrderLayout,
}

/// A page of a [`Document`].
///
/// Text coordinates (glyph boxes, search results, clip rectangles) are in
/// points, with the origin at the top-left corner of the crop box and y
/// growing downwards. The page rotation is not applied.
#[derive(Debug, Clone, Copy)]
pub struct Page<'doc> {
    doc: &'doc Document,
    index: usize,
    id: ObjectId,
    dict: &'doc Dictionary,
}

impl<'doc> Page<'doc> {
    pub(crate) fn new(doc: &'doc Document, index: usize, id: ObjectId, dict: &'doc Dictionary) -> Self {
        Self {
            doc,
            index,
            id,
            dict,
        }
    }

    /// 0-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Object id of the page dictionary.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Page rotation in degrees: 0, 90, 180 or 270.
    ///
    /// `/Rotate` is inherited through the page tree and normalised; values
    /// that are not a multiple of 90 count as 0.
    pub fn rotation_degrees(&self) -> u32 {
        let raw = inherited(self.lopdf(), self.dict, b"Rotate")
            .and_then(number)
            .map_or(0, |r| r as i64);
        let normalized = raw.rem_euclid(360);
        if normalized % 90 == 0 {
            normalized as u32
        } else {
            0
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self.rotation_degrees() {
            90 => Orientation::Landscape,
            180 => Orientation::UpsideDown,
            270 => Orientation::Seascape,
            _ => Orientation::Portrait,
        }
    }

    /// Display duration in seconds for presentations (`/Dur`), or -1 when
    /// the page does not set one.
    pub fn duration(&self) -> f64 {
        dict_get(self.lopdf(), self.dict, b"Dur")
            .and_then(number)
            .unwrap_or(-1.0)
    }

    /// One of the page boxes, in PDF user space.
    ///
    /// The corners map as `left = llx`, `top = lly`, `right = urx`,
    /// `bottom = ury`. The crop box defaults to the media box; bleed, trim
    /// and art boxes default to the crop box. Every box is clipped to the
    /// media box.
    pub fn page_rect(&self, which: PageBox) -> Rect {
        let doc = self.lopdf();
        let media = inherited(doc, self.dict, b"MediaBox")
            .and_then(|o| pdf_rect(doc, o))
            .unwrap_or(DEFAULT_MEDIA_BOX);
        let crop = inherited(doc, self.dict, b"CropBox")
            .and_then(|o| pdf_rect(doc, o))
            .map_or(media, |r| clip(&r, &media));

        let own = |key: &[u8]| {
            dict_get(doc, self.dict, key)
                .and_then(|o| pdf_rect(doc, o))
                .map_or(crop, |r| clip(&r, &media))
        };

        match which {
            PageBox::MediaBox => media,
            PageBox::CropBox => crop,
            PageBox::BleedBox => own(b"BleedBox"),
            PageBox::TrimBox => own(b"TrimBox"),
            PageBox::ArtBox => own(b"ArtBox"),
        }
    }

    /// The crop box, the visible area of the page.
    pub fn crop_rect(&self) -> Rect {
        self.page_rect(PageBox::CropBox)
    }

    /// Width and height of the crop box, unrotated.
    pub fn size(&self) -> (f64, f64) {
        let crop = self.crop_rect();
        (crop.width(), crop.height())
    }

    /// The page label, or the 1-based page number when the document does
    /// not define labels.
    pub fn label(&self) -> String {
        self.doc.labels().label(self.index)
    }

    /// The presentation transition into this page, if any.
    pub fn transition(&self) -> Option<PageTransition> {
        let doc = self.lopdf();
        let trans = resolve_dict(doc, self.dict.get(b"Trans").ok()?)?;
        Some(PageTransition::from_dict(doc, trans))
    }

    /// Search the page for `text`.
    ///
    /// Results are reported in the coordinate space rotated by `rotation`,
    /// and `rect` is read as the anchor for `NextResult` and
    /// `PreviousResult` in that same space. Matches are visited in the
    /// reading order of the page text whatever the rotation. On a match
    /// `rect` receives the match box and `true` is returned; otherwise
    /// `rect` is left unchanged.
    pub fn search(
        &self,
        text: &str,
        rect: &mut Rect,
        direction: SearchDirection,
        case: CaseSensitivity,
        rotation: Rotation,
    ) -> Result<bool> {
        if text.is_empty() {
            return Ok(false);
        }
        let (width, height) = self.size();
        let to_rotated = rotation.matrix(width, height);
        let anchor = to_rotated
            .inverse()
            .map_or(*rect, |m| m.transform_bounds(rect.left, rect.top, rect.right, rect.bottom));

        let matches = self.matches(text, case)?;
        match select(&matches, &anchor, direction) {
            Some(i) => {
                let found = matches[i].bbox;
                *rect = to_rotated.transform_bounds(found.left, found.top, found.right, found.bottom);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Every match of `text` on the page, in reading order, unrotated.
    pub fn find_all(&self, text: &str, case: CaseSensitivity) -> Result<Vec<Rect>> {
        Ok(self.matches(text, case)?.into_iter().map(|m| m.bbox).collect())
    }

    fn matches(&self, text: &str, case: CaseSensitivity) -> Result<Vec<TextMatch>> {
        let lines = into_lines(build_words(&self.glyphs()?));
        Ok(find_all(&lines, text, case))
    }

    /// The page text in physical layout.
    ///
    /// With a non-empty `rect`, only glyphs whose centre lies inside it are
    /// kept.
    pub fn text(&self, rect: Option<Rect>) -> Result<String> {
        self.text_with_layout(rect, TextLayout::PhysicalLayout)
    }

    pub fn text_with_layout(&self, rect: Option<Rect>, layout: TextLayout) -> Result<String> {
        let mut glyphs = self.glyphs()?;
        if let Some(clip) = rect.filter(|r| !r.is_empty()) {
            glyphs.retain(|g| {
                let (x, y) = g.bbox.center();
                clip.contains_point(x, y)
            });
        }
        let words = build_words(&glyphs);
        Ok(match layout {
            TextLayout::RawOrderLayout => raw_text(&words),
            TextLayout::PhysicalLayout => physical_text(&into_lines(words)),
        })
    }

    /// The words of the page in reading order.
    pub fn text_list(&self) -> Result<Vec<TextBox>> {
        Ok(into_lines(build_words(&self.glyphs()?))
            .into_iter()
            .flat_map(|line| line.words)
            .collect())
    }

    /// Glyphs in content-stream order, in top-left page space.
    pub(crate) fn glyphs(&self) -> Result<Vec<Glyph>> {
        let crop = self.crop_rect();
        let to_page = Matrix::new(1.0, 0.0, 0.0, -1.0, -crop.left, crop.bottom);
        log::debug!("interpreting page {} ({} {} R)", self.index + 1, self.id.0, self.id.1);
        TextInterpreter::new(self.lopdf(), to_page, self.doc.options().error_mode).run_page(self.dict)
    }

    fn lopdf(&self) -> &'doc lopdf::Document {
        self.doc.lopdf()
    }
}

/// Intersection of `r` and `bounds`, or `bounds` when they do not overlap.
fn clip(r: &Rect, bounds: &Rect) -> Rect {
    let clipped = Rect::new(
        r.left.max(bounds.left),
        r.top.max(bounds.top),
        r.right.min(bounds.right),
        r.bottom.min(bounds.bottom),
    );
    if clipped.left < clipped.right && clipped.top < clipped.bottom {
        clipped
    } else {
        *bounds
    }
}
