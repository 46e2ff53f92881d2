//! Low-level PDF object access and content interpretation.

mod cmap;
mod content;
mod font;

pub(crate) use cmap::ToUnicodeMap;
pub(crate) use content::{Glyph, TextInterpreter};
pub(crate) use font::FontMetrics;

use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Reference chains longer than this are treated as broken.
const MAX_REFERENCE_DEPTH: usize = 32;

/// Follow indirect references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, mut obj: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_REFERENCE_DEPTH {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id).ok()?,
            _ => return Some(obj),
        }
    }
    None
}

/// Resolve an object to a dictionary (a stream resolves to its dictionary).
pub(crate) fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Look up a key and resolve the value.
pub(crate) fn dict_get<'a>(
    doc: &'a LopdfDocument,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    resolve(doc, dict.get(key).ok()?)
}

/// Look up a key on a page dictionary, walking up the `/Parent` chain.
pub(crate) fn inherited<'a>(
    doc: &'a LopdfDocument,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_REFERENCE_DEPTH {
        if let Some(value) = dict_get(doc, node, key) {
            return Some(value);
        }
        node = resolve_dict(doc, node.get(b"Parent").ok()?)?;
    }
    None
}

/// Extract a number from a PDF object.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Read a numeric array, resolving each element.
pub(crate) fn number_array(doc: &LopdfDocument, obj: &Object) -> Option<Vec<f64>> {
    match resolve(doc, obj)? {
        Object::Array(items) => items
            .iter()
            .map(|item| resolve(doc, item).and_then(number))
            .collect(),
        _ => None,
    }
}

/// Read a `[llx lly urx ury]` rectangle, normalising the corner order.
pub(crate) fn pdf_rect(doc: &LopdfDocument, obj: &Object) -> Option<Rect> {
    let values = number_array(doc, obj)?;
    if values.len() < 4 {
        return None;
    }
    Some(Rect::new(values[0], values[1], values[2], values[3]).normalized())
}

/// The raw bytes of a stream, decoded when a filter is present.
pub(crate) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|e| Error::PdfParse(format!("cannot decode stream: {}", e)))
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8, or Latin-1).
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Read a string-valued (or name-valued) entry as text.
pub(crate) fn text_entry(doc: &LopdfDocument, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict_get(doc, dict, key)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}
