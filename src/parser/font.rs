//! Font metrics and character decoding.

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use super::{dict_get, number, number_array, resolve, resolve_dict, stream_bytes, ToUnicodeMap};

/// Glyph widths of Helvetica for codes 32..=126, in thousandths of an em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

const DEFAULT_ASCENT: f64 = 0.8;
const DEFAULT_DESCENT: f64 = -0.2;

/// Width source for fonts without usable `/Widths`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuiltinWidths {
    Monospace,
    Proportional,
}

#[derive(Debug, Clone)]
enum Widths {
    /// Simple font: `/FirstChar` + `/Widths`, scaled to em units
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    /// CID font: `/W` ranges with a default width
    Cid {
        ranges: Vec<(u32, u32, f64)>,
        default: f64,
    },
    Builtin(BuiltinWidths),
}

/// Decoder backed by the font's `/Encoding` (via lopdf).
type EncodingDecoder<'a> = Box<dyn Fn(&[u8]) -> Option<String> + 'a>;

/// Everything the text interpreter needs to know about one font resource.
pub(crate) struct FontMetrics<'a> {
    base_font: String,
    code_size: usize,
    widths: Widths,
    ascent: f64,
    descent: f64,
    to_unicode: Option<ToUnicodeMap>,
    encoding: Option<EncodingDecoder<'a>>,
}

impl<'a> FontMetrics<'a> {
    /// Build metrics from a font dictionary.
    pub(crate) fn from_dict(doc: &'a LopdfDocument, font: &'a Dictionary) -> Self {
        let subtype = font
            .get(b"Subtype")
            .and_then(Object::as_name)
            .unwrap_or_default();
        let base_font = font
            .get(b"BaseFont")
            .and_then(Object::as_name)
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_else(|_| "Unknown".to_string());

        let is_composite = subtype == b"Type0";
        let descendant = if is_composite {
            dict_get(doc, font, b"DescendantFonts")
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|first| resolve_dict(doc, first))
        } else {
            None
        };

        // Type3 glyph space is defined by /FontMatrix instead of 1/1000 em.
        let glyph_scale = if subtype == b"Type3" {
            dict_get(doc, font, b"FontMatrix")
                .and_then(|m| number_array(doc, m))
                .and_then(|m| m.first().copied())
        } else {
            None
        };

        let widths = match descendant {
            Some(cid_font) => cid_widths(doc, cid_font),
            None => simple_widths(doc, font, &base_font, glyph_scale),
        };

        let descriptor = descendant
            .unwrap_or(font)
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| resolve_dict(doc, d));
        let (ascent, descent) = descriptor
            .map(|d| vertical_metrics(doc, d))
            .unwrap_or((DEFAULT_ASCENT, DEFAULT_DESCENT));

        let to_unicode = dict_get(doc, font, b"ToUnicode")
            .and_then(|o| o.as_stream().ok())
            .and_then(|s| stream_bytes(s).ok())
            .map(|data| ToUnicodeMap::parse(&data))
            .filter(|map| !map.is_empty());

        let code_size = match &to_unicode {
            Some(map) if is_composite => map.code_lengths().last().copied().unwrap_or(2),
            _ if is_composite => 2,
            _ => 1,
        };

        // lopdf asserts `/Type /Font` before reading the encoding.
        let encoding = font
            .type_is(b"Font")
            .then(|| font.get_font_encoding(doc).ok())
            .flatten()
            .map(|enc| {
                Box::new(move |raw: &[u8]| LopdfDocument::decode_text(&enc, raw).ok())
                    as EncodingDecoder<'a>
            });

        log::debug!(
            "font {} ({}), code size {}, ToUnicode: {}",
            base_font,
            String::from_utf8_lossy(subtype),
            code_size,
            to_unicode.is_some()
        );

        Self {
            base_font,
            code_size,
            widths,
            ascent,
            descent,
            to_unicode,
            encoding,
        }
    }

    pub(crate) fn base_font(&self) -> &str {
        &self.base_font
    }

    /// Bytes per character code.
    pub(crate) fn code_size(&self) -> usize {
        self.code_size
    }

    pub(crate) fn ascent(&self) -> f64 {
        self.ascent
    }

    pub(crate) fn descent(&self) -> f64 {
        self.descent
    }

    /// Split a shown string into `(code, raw bytes)` pairs.
    pub(crate) fn codes<'b>(&self, bytes: &'b [u8]) -> impl Iterator<Item = (u32, &'b [u8])> + 'b {
        bytes.chunks(self.code_size).map(|raw| {
            let code = raw.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
            (code, raw)
        })
    }

    /// Horizontal advance of a code, in em units.
    pub(crate) fn width(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Cid { ranges, default } => ranges
                .iter()
                .find(|(lo, hi, _)| code >= *lo && code <= *hi)
                .map(|(_, _, w)| *w)
                .unwrap_or(*default),
            Widths::Builtin(BuiltinWidths::Monospace) => 0.6,
            Widths::Builtin(BuiltinWidths::Proportional) => match code {
                32..=126 => HELVETICA_WIDTHS[(code - 32) as usize] as f64 / 1000.0,
                _ => 0.5,
            },
        }
    }

    /// Unicode text for a code.
    pub(crate) fn decode(&self, code: u32, raw: &[u8]) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return text;
        }
        if self.code_size > 1 {
            // Identity-ordered CID fonts without a ToUnicode map
            return char::from_u32(code).map(String::from).unwrap_or_default();
        }
        if let Some(text) = self.encoding.as_ref().and_then(|decode| decode(raw)) {
            return text;
        }
        raw.iter().map(|&b| b as char).collect()
    }
}

fn simple_widths(
    doc: &LopdfDocument,
    font: &Dictionary,
    base_font: &str,
    glyph_scale: Option<f64>,
) -> Widths {
    let scale = |w: f64| match glyph_scale {
        Some(factor) => w * factor,
        None => w / 1000.0,
    };

    let missing = font
        .get(b"FontDescriptor")
        .ok()
        .and_then(|d| resolve_dict(doc, d))
        .and_then(|d| dict_get(doc, d, b"MissingWidth"))
        .and_then(number)
        .map(scale)
        .unwrap_or(0.0);

    let widths = dict_get(doc, font, b"Widths").and_then(|w| number_array(doc, w));
    let first_char = dict_get(doc, font, b"FirstChar")
        .and_then(number)
        .unwrap_or(0.0)
        .max(0.0) as u32;

    match widths {
        Some(widths) if !widths.is_empty() => Widths::Simple {
            first_char,
            widths: widths.into_iter().map(scale).collect(),
            missing,
        },
        _ => Widths::Builtin(builtin_for(base_font)),
    }
}

fn builtin_for(base_font: &str) -> BuiltinWidths {
    // Subset prefixes look like "ABCDEF+Courier"
    let name = base_font.rsplit('+').next().unwrap_or(base_font);
    if name.starts_with("Courier") || name.contains("Mono") {
        BuiltinWidths::Monospace
    } else {
        BuiltinWidths::Proportional
    }
}

fn cid_widths(doc: &LopdfDocument, cid_font: &Dictionary) -> Widths {
    let default = dict_get(doc, cid_font, b"DW")
        .and_then(number)
        .unwrap_or(1000.0)
        / 1000.0;

    let mut ranges = Vec::new();
    if let Some(Object::Array(items)) = dict_get(doc, cid_font, b"W") {
        let items: Vec<&Object> = items.iter().filter_map(|o| resolve(doc, o)).collect();
        let mut i = 0;
        while i + 1 < items.len() {
            let Some(first) = number(items[i]) else {
                break;
            };
            let first = first as u32;
            match items[i + 1] {
                Object::Array(list) => {
                    for (offset, w) in list.iter().filter_map(|o| resolve(doc, o)).enumerate() {
                        if let Some(w) = number(w) {
                            let cid = first + offset as u32;
                            ranges.push((cid, cid, w / 1000.0));
                        }
                    }
                    i += 2;
                }
                other => {
                    let (Some(last), Some(w)) = (number(other), items.get(i + 2).and_then(|o| number(o)))
                    else {
                        break;
                    };
                    ranges.push((first, last as u32, w / 1000.0));
                    i += 3;
                }
            }
        }
    }

    Widths::Cid { ranges, default }
}

fn vertical_metrics(doc: &LopdfDocument, descriptor: &Dictionary) -> (f64, f64) {
    let ascent = dict_get(doc, descriptor, b"Ascent")
        .and_then(number)
        .map(|a| a / 1000.0)
        .filter(|a| *a > 0.0 && *a <= 1.5)
        .unwrap_or(DEFAULT_ASCENT);
    let descent = dict_get(doc, descriptor, b"Descent")
        .and_then(number)
        .map(|d| d / 1000.0)
        .filter(|d| *d < 0.0 && *d >= -1.0)
        .unwrap_or(DEFAULT_DESCENT);
    (ascent, descent)
}
