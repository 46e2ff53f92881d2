//! Content stream interpretation for text extraction.
//!
//! The interpreter tracks just enough of the graphics state (CTM, text
//! state, text and line matrices) to place every shown glyph on the page.
//! Paths, images, colours and clipping are ignored.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object};

use super::{dict_get, number, number_array, resolve, resolve_dict, stream_bytes, FontMetrics};
use crate::error::{Error, Result};
use crate::geometry::{Matrix, Rect};
use crate::options::ErrorMode;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 16;

/// One shown glyph, positioned in page space.
#[derive(Debug, Clone)]
pub(crate) struct Glyph {
    /// Decoded text; may hold several characters (ligatures) or none
    pub text: String,
    /// Glyph box, top-left origin
    pub bbox: Rect,
    /// Pen position on the baseline before the glyph was shown
    pub origin: (f64, f64),
    /// Writing direction: 0 = right, 1 = down, 2 = left, 3 = up
    pub dir: u8,
    /// Effective font size in page space
    pub font_size: f64,
    pub font_name: Rc<str>,
}

impl Glyph {
    pub(crate) fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

#[derive(Clone)]
struct TextState<'a> {
    font: Option<Rc<LoadedFont<'a>>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState<'_> {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

struct LoadedFont<'a> {
    metrics: FontMetrics<'a>,
    name: Rc<str>,
}

#[derive(Clone, Default)]
struct GraphicsState<'a> {
    ctm: Matrix,
    text: TextState<'a>,
}

/// Walks page content and collects positioned glyphs.
pub(crate) struct TextInterpreter<'a> {
    doc: &'a LopdfDocument,
    /// Default user space to page space
    page_matrix: Matrix,
    error_mode: ErrorMode,
    glyphs: Vec<Glyph>,
}

impl<'a> TextInterpreter<'a> {
    pub(crate) fn new(doc: &'a LopdfDocument, page_matrix: Matrix, error_mode: ErrorMode) -> Self {
        Self {
            doc,
            page_matrix,
            error_mode,
            glyphs: Vec::new(),
        }
    }

    /// Interpret a page and return its glyphs in content-stream order.
    pub(crate) fn run_page(mut self, page: &'a Dictionary) -> Result<Vec<Glyph>> {
        let content = page_content(self.doc, page)?;
        let resources =
            super::inherited(self.doc, page, b"Resources").and_then(|r| resolve_dict(self.doc, r));
        let state = GraphicsState::default();
        self.run(&content, resources, state, 0)?;
        Ok(self.glyphs)
    }

    fn run(
        &mut self,
        data: &[u8],
        resources: Option<&'a Dictionary>,
        initial: GraphicsState<'a>,
        depth: usize,
    ) -> Result<()> {
        let content = match Content::decode(data) {
            Ok(content) => content,
            Err(e) => {
                return match self.error_mode {
                    ErrorMode::Strict => Err(Error::PdfParse(format!(
                        "cannot decode content stream: {}",
                        e
                    ))),
                    ErrorMode::Lenient => {
                        log::warn!("skipping undecodable content stream: {}", e);
                        Ok(())
                    }
                }
            }
        };

        let mut fonts: HashMap<Vec<u8>, Option<Rc<LoadedFont<'a>>>> = HashMap::new();
        let mut stack: Vec<GraphicsState<'a>> = Vec::new();
        let mut gs = initial;
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;

        for op in &content.operations {
            let operands = &op.operands;
            let num = |i: usize| operands.get(i).and_then(number);

            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(operands) {
                        gs.ctm = m.then(&gs.ctm);
                    }
                }
                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "ET" => {}
                "Tf" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        let font = fonts
                            .entry(name.clone())
                            .or_insert_with(|| self.load_font(resources, name))
                            .clone();
                        if font.is_none() {
                            log::debug!("font /{} not found", String::from_utf8_lossy(name));
                        }
                        gs.text.font = font;
                    }
                    if let Some(size) = num(1) {
                        gs.text.font_size = size;
                    }
                }
                "Tc" => gs.text.char_spacing = num(0).unwrap_or(0.0),
                "Tw" => gs.text.word_spacing = num(0).unwrap_or(0.0),
                "Tz" => gs.text.horizontal_scaling = num(0).unwrap_or(100.0) / 100.0,
                "TL" => gs.text.leading = num(0).unwrap_or(0.0),
                "Ts" => gs.text.rise = num(0).unwrap_or(0.0),
                "Td" => {
                    let (tx, ty) = (num(0).unwrap_or(0.0), num(1).unwrap_or(0.0));
                    tlm = Matrix::translation(tx, ty).then(&tlm);
                    tm = tlm;
                }
                "TD" => {
                    let (tx, ty) = (num(0).unwrap_or(0.0), num(1).unwrap_or(0.0));
                    gs.text.leading = -ty;
                    tlm = Matrix::translation(tx, ty).then(&tlm);
                    tm = tlm;
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(operands) {
                        tlm = m;
                        tm = m;
                    }
                }
                "T*" => {
                    tlm = Matrix::translation(0.0, -gs.text.leading).then(&tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes, &gs, &mut tm);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(bytes, &gs, &mut tm),
                                other => {
                                    if let Some(adjust) = number(other) {
                                        let tx = -adjust / 1000.0
                                            * gs.text.font_size
                                            * gs.text.horizontal_scaling;
                                        tm = Matrix::translation(tx, 0.0).then(&tm);
                                    }
                                }
                            }
                        }
                    }
                }
                "'" | "\"" => {
                    let text_index = if op.operator == "\"" {
                        gs.text.word_spacing = num(0).unwrap_or(gs.text.word_spacing);
                        gs.text.char_spacing = num(1).unwrap_or(gs.text.char_spacing);
                        2
                    } else {
                        0
                    };
                    tlm = Matrix::translation(0.0, -gs.text.leading).then(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.get(text_index) {
                        self.show(bytes, &gs, &mut tm);
                    }
                }
                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.run_form(resources, name, &gs, depth)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn load_font(&self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<Rc<LoadedFont<'a>>> {
        let fonts = dict_get(self.doc, resources?, b"Font")?;
        let fonts = resolve_dict(self.doc, fonts)?;
        let font = resolve_dict(self.doc, fonts.get(name).ok()?)?;
        let metrics = FontMetrics::from_dict(self.doc, font);
        let name: Rc<str> = Rc::from(metrics.base_font());
        Some(Rc::new(LoadedFont { metrics, name }))
    }

    fn run_form(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        gs: &GraphicsState<'a>,
        depth: usize,
    ) -> Result<()> {
        if depth >= MAX_FORM_DEPTH {
            log::warn!("form XObjects nested too deeply; skipping");
            return Ok(());
        }
        let Some(xobjects) = resources
            .and_then(|r| dict_get(self.doc, r, b"XObject"))
            .and_then(|x| resolve_dict(self.doc, x))
        else {
            return Ok(());
        };
        let Some(Object::Stream(stream)) = xobjects
            .get(name)
            .ok()
            .and_then(|o| resolve(self.doc, o))
        else {
            return Ok(());
        };
        if stream.dict.get(b"Subtype").and_then(Object::as_name).ok() != Some(b"Form".as_slice()) {
            return Ok(());
        }

        let data = match stream_bytes(stream) {
            Ok(data) => data,
            Err(e) if self.error_mode == ErrorMode::Lenient => {
                log::warn!("skipping form /{}: {}", String::from_utf8_lossy(name), e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let form_matrix = dict_get(self.doc, &stream.dict, b"Matrix")
            .and_then(|m| number_array(self.doc, m))
            .filter(|m| m.len() >= 6)
            .map(|m| Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5]))
            .unwrap_or(Matrix::IDENTITY);
        let form_resources = dict_get(self.doc, &stream.dict, b"Resources")
            .and_then(|r| resolve_dict(self.doc, r))
            .or(resources);

        let mut inner = gs.clone();
        inner.ctm = form_matrix.then(&gs.ctm);
        self.run(&data, form_resources, inner, depth + 1)
    }

    fn show(&mut self, bytes: &[u8], gs: &GraphicsState<'a>, tm: &mut Matrix) {
        let Some(font) = gs.text.font.clone() else {
            log::debug!("text shown without a font; skipping");
            return;
        };
        let ts = &gs.text;
        let metrics = &font.metrics;

        for (code, raw) in metrics.codes(bytes) {
            let w0 = metrics.width(code);
            let trm = Matrix::new(
                ts.font_size * ts.horizontal_scaling,
                0.0,
                0.0,
                ts.font_size,
                0.0,
                ts.rise,
            )
            .then(tm)
            .then(&gs.ctm)
            .then(&self.page_matrix);

            let bbox = trm.transform_bounds(0.0, metrics.descent(), w0, metrics.ascent());
            let origin = trm.transform_point(0.0, 0.0);
            let text = metrics.decode(code, raw);

            self.glyphs.push(Glyph {
                text,
                bbox,
                origin,
                dir: direction(trm.a, trm.b),
                font_size: trm.vertical_scale(),
                font_name: font.name.clone(),
            });

            let word_spacing = if metrics.code_size() == 1 && code == 32 {
                ts.word_spacing
            } else {
                0.0
            };
            let tx = (w0 * ts.font_size + ts.char_spacing + word_spacing) * ts.horizontal_scaling;
            *tm = Matrix::translation(tx, 0.0).then(tm);
        }
    }
}

/// Classify the text advance vector into one of four directions.
fn direction(dx: f64, dy: f64) -> u8 {
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            0
        } else {
            2
        }
    } else if dy > 0.0 {
        1
    } else {
        3
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let v: Option<Vec<f64>> = operands[..6].iter().map(number).collect();
    let v = v?;
    Some(Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]))
}

/// Concatenate the page's content streams.
fn page_content(doc: &LopdfDocument, page: &Dictionary) -> Result<Vec<u8>> {
    let Some(contents) = dict_get(doc, page, b"Contents") else {
        return Ok(Vec::new());
    };

    match contents {
        Object::Stream(stream) => stream_bytes(stream),
        Object::Array(parts) => {
            let mut content = Vec::new();
            for part in parts {
                match resolve(doc, part) {
                    Some(Object::Stream(stream)) => {
                        content.extend_from_slice(&stream_bytes(stream)?);
                        content.push(b'\n');
                    }
                    _ => {
                        return Err(Error::MissingObject(
                            "content stream referenced by /Contents".to_string(),
                        ))
                    }
                }
            }
            Ok(content)
        }
        _ => Err(Error::PdfParse("Invalid content stream".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn page_with_content(content: &[u8]) -> (LopdfDocument, lopdf::ObjectId) {
        let mut doc = LopdfDocument::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        (doc, page_id)
    }

    fn glyphs_of(content: &[u8]) -> Vec<Glyph> {
        let (doc, page_id) = page_with_content(content);
        let page = doc.get_dictionary(page_id).unwrap();
        TextInterpreter::new(&doc, Matrix::IDENTITY, ErrorMode::Strict)
            .run_page(page)
            .unwrap()
    }

    #[test]
    fn test_glyph_positions_follow_widths() {
        let glyphs = glyphs_of(b"BT /F1 10 Tf 100 200 Td (AB) Tj ET");
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].text, "A");
        assert_eq!(glyphs[0].origin, (100.0, 200.0));
        // Courier advances 0.6 em
        assert!((glyphs[1].origin.0 - 106.0).abs() < 1e-9);
        assert!((glyphs[0].bbox.width() - 6.0).abs() < 1e-9);
        assert!((glyphs[0].font_size - 10.0).abs() < 1e-9);
        assert_eq!(glyphs[0].dir, 0);
        assert_eq!(&*glyphs[0].font_name, "Courier");
    }

    #[test]
    fn test_tj_adjustment_moves_pen() {
        let glyphs = glyphs_of(b"BT /F1 10 Tf 0 0 Td [(A) -1000 (B)] TJ ET");
        assert_eq!(glyphs.len(), 2);
        // 6pt advance + 10pt adjustment
        assert!((glyphs[1].origin.0 - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_leading_and_next_line() {
        let glyphs = glyphs_of(b"BT /F1 10 Tf 14 TL 0 100 Td (A) Tj T* (B) Tj (C) ' ET");
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0].origin.1, 100.0);
        assert_eq!(glyphs[1].origin.1, 86.0);
        assert_eq!(glyphs[2].origin.1, 72.0);
        assert_eq!(glyphs[2].origin.0, 0.0);
    }

    #[test]
    fn test_ctm_and_state_stack() {
        let glyphs = glyphs_of(b"q 2 0 0 2 10 10 cm BT /F1 10 Tf (A) Tj ET Q BT /F1 10 Tf (B) Tj ET");
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].origin, (10.0, 10.0));
        assert!((glyphs[0].font_size - 20.0).abs() < 1e-9);
        assert_eq!(glyphs[1].origin, (0.0, 0.0));
    }

    #[test]
    fn test_word_spacing_applies_to_space() {
        let glyphs = glyphs_of(b"BT /F1 10 Tf 5 Tw (A B) Tj ET");
        assert_eq!(glyphs.len(), 3);
        assert!(glyphs[1].is_whitespace());
        // A: 6, space: 6 + 5
        assert!((glyphs[2].origin.0 - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_without_font_is_skipped() {
        let glyphs = glyphs_of(b"BT 0 0 Td (A) Tj ET");
        assert!(glyphs.is_empty());
    }

    #[test]
    fn test_page_matrix_flips_to_top_left() {
        let (doc, page_id) = page_with_content(b"BT /F1 10 Tf 100 700 Td (A) Tj ET");
        let page = doc.get_dictionary(page_id).unwrap();
        let flip = Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, 792.0);
        let glyphs = TextInterpreter::new(&doc, flip, ErrorMode::Strict)
            .run_page(page)
            .unwrap();
        assert_eq!(glyphs[0].origin, (100.0, 92.0));
        assert!(glyphs[0].bbox.top < 92.0);
        assert!(glyphs[0].bbox.bottom > 92.0);
    }

    #[test]
    fn test_form_xobject_text() {
        let mut doc = LopdfDocument::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "Matrix" => vec![
                    Object::Integer(1), Object::Integer(0), Object::Integer(0),
                    Object::Integer(1), Object::Integer(50), Object::Integer(60),
                ],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F9" => Object::Reference(font_id) },
                },
            },
            b"BT /F9 10 Tf (X) Tj ET".to_vec(),
        ));
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"/Fm1 Do".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Fm1" => Object::Reference(form_id) },
            },
        });
        let page = doc.get_dictionary(page_id).unwrap();
        let glyphs = TextInterpreter::new(&doc, Matrix::IDENTITY, ErrorMode::Strict)
            .run_page(page)
            .unwrap();
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0].text, "X");
        assert_eq!(glyphs[0].origin, (50.0, 60.0));
    }

    #[test]
    fn test_direction_classification() {
        assert_eq!(direction(1.0, 0.0), 0);
        assert_eq!(direction(0.0, 1.0), 1);
        assert_eq!(direction(-1.0, 0.0), 2);
        assert_eq!(direction(0.0, -1.0), 3);
    }
}
