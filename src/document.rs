//! PDF documents and whole-document helpers.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use lopdf::{Document as LopdfDocument, Object, ObjectId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::detect::{sniff_bytes, sniff_path, PdfHeader};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::labels::PageLabels;
use crate::options::LoadOptions;
use crate::page::{CaseSensitivity, Page, TextLayout};
use crate::parser::{dict_get, resolve_dict, text_entry};

/// Document information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages
    pub page_count: usize,

    /// Whether the document is encrypted
    pub encrypted: bool,

    /// Whether the document is tagged (accessible)
    pub tagged: bool,
}

/// A loaded PDF document.
///
/// The document is immutable once loaded; pages borrow it.
#[derive(Debug)]
pub struct Document {
    inner: LopdfDocument,
    page_ids: Vec<ObjectId>,
    labels: PageLabels,
    header: PdfHeader,
    options: LoadOptions,
    encrypted: bool,
}

impl Document {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, LoadOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a PDF
        let header = sniff_path(path)?;

        let inner = LopdfDocument::load(path)?;
        Self::from_lopdf(inner, header, options)
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, LoadOptions::default())
    }

    /// Load a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: LoadOptions) -> Result<Self> {
        let header = sniff_bytes(data)?;
        let inner = LopdfDocument::load_mem(data)?;
        Self::from_lopdf(inner, header, options)
    }

    /// Load a PDF from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, LoadOptions::default())
    }

    /// Load a PDF from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: LoadOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    fn from_lopdf(mut inner: LopdfDocument, header: PdfHeader, options: LoadOptions) -> Result<Self> {
        let encrypted = unlock(&mut inner)?;

        let page_ids: Vec<ObjectId> = inner.get_pages().into_values().collect();
        let labels = inner
            .catalog()
            .map(|catalog| PageLabels::from_catalog(&inner, catalog))
            .unwrap_or_default();

        log::debug!(
            "loaded {} with {} pages{}",
            header,
            page_ids.len(),
            if header.linearized { " (linearized)" } else { "" }
        );

        Ok(Self {
            inner,
            page_ids,
            labels,
            header,
            options,
            encrypted,
        })
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// The page at a 0-based index.
    pub fn page(&self, index: usize) -> Result<Page<'_>> {
        let id = *self
            .page_ids
            .get(index)
            .ok_or(Error::PageOutOfRange(index, self.page_ids.len()))?;
        let dict = self
            .inner
            .get_dictionary(id)
            .map_err(|_| Error::MissingObject(format!("page object {} {} R", id.0, id.1)))?;
        Ok(Page::new(self, index, id, dict))
    }

    /// All pages in order. Pages whose object cannot be read are skipped.
    pub fn pages(&self) -> impl Iterator<Item = Page<'_>> + '_ {
        (0..self.page_count()).filter_map(move |i| match self.page(i) {
            Ok(page) => Some(page),
            Err(e) => {
                log::warn!("skipping page {}: {}", i + 1, e);
                None
            }
        })
    }

    /// PDF version from the file header.
    pub fn version(&self) -> &str {
        &self.header.version
    }

    pub fn header(&self) -> &PdfHeader {
        &self.header
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Whether the file carries an `/Encrypt` dictionary. Documents that
    /// load despite it were opened with the empty user password.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Document information dictionary and catalog flags.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata {
            pdf_version: self.header.version.clone(),
            page_count: self.page_count(),
            encrypted: self.is_encrypted(),
            ..Default::default()
        };

        if let Some(info) = self
            .inner
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| resolve_dict(&self.inner, o))
        {
            let doc = &self.inner;
            metadata.title = text_entry(doc, info, b"Title");
            metadata.author = text_entry(doc, info, b"Author");
            metadata.subject = text_entry(doc, info, b"Subject");
            metadata.keywords = text_entry(doc, info, b"Keywords");
            metadata.creator = text_entry(doc, info, b"Creator");
            metadata.producer = text_entry(doc, info, b"Producer");
            metadata.created = text_entry(doc, info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified = text_entry(doc, info, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        if let Ok(catalog) = self.inner.catalog() {
            metadata.tagged = dict_get(&self.inner, catalog, b"MarkInfo")
                .and_then(|o| resolve_dict(&self.inner, o))
                .and_then(|mark| dict_get(&self.inner, mark, b"Marked"))
                .map_or(false, |m| matches!(m, Object::Boolean(true)));
        }

        metadata
    }

    /// Index of the page carrying `label`. Plain page numbers are accepted
    /// as a fallback.
    pub fn page_label_to_index(&self, label: &str) -> Option<usize> {
        self.labels.index_of(label, self.page_count())
    }

    /// Text of every selected page (see [`LoadOptions::pages`]).
    pub fn text(&self, layout: TextLayout) -> Result<Vec<String>> {
        self.map_selected(|page| page.text_with_layout(None, layout))
    }

    /// Every match of `query` in the selected pages, as `(page index, box)`.
    pub fn search_all(&self, query: &str, case: CaseSensitivity) -> Result<Vec<(usize, Rect)>> {
        let per_page = self.map_selected(|page| {
            let index = page.index();
            Ok(page
                .find_all(query, case)?
                .into_iter()
                .map(|rect| (index, rect))
                .collect::<Vec<_>>())
        })?;
        Ok(per_page.into_iter().flatten().collect())
    }

    /// 0-based indices of the pages chosen by the load options.
    pub fn selected_indices(&self) -> Vec<usize> {
        (0..self.page_count())
            .filter(|&i| self.options.pages.includes_index(i))
            .collect()
    }

    fn map_selected<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(Page<'_>) -> Result<T> + Sync + Send,
    {
        let indices = self.selected_indices();
        let run = |i: usize| -> Result<T> { f(self.page(i)?) };

        if self.options.parallel {
            indices.into_par_iter().map(run).collect()
        } else {
            indices.into_iter().map(run).collect()
        }
    }

    pub(crate) fn lopdf(&self) -> &LopdfDocument {
        &self.inner
    }

    pub(crate) fn labels(&self) -> &PageLabels {
        &self.labels
    }
}

/// Open an encrypted document with the empty user password.
///
/// Returns whether the document was encrypted; fails with
/// [`Error::Encrypted`] when a real password is required.
fn unlock(inner: &mut LopdfDocument) -> Result<bool> {
    if !inner.is_encrypted() {
        return Ok(false);
    }
    match inner.decrypt("") {
        Ok(()) => {
            log::debug!("opened encrypted document with the empty user password");
            Ok(true)
        }
        Err(e) => {
            log::debug!("cannot decrypt document: {}", e);
            Err(Error::Encrypted)
        }
    }
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS...`).
fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    // At minimum we need YYYY
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}
