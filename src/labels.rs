//! Page labels from the catalog `/PageLabels` number tree.

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::parser::{dict_get, resolve, resolve_dict, text_entry};

/// Number trees nested deeper than this are ignored.
const MAX_TREE_DEPTH: usize = 32;

/// Numbering style of a label range (`/S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelStyle {
    /// `D`: 1, 2, 3
    Decimal,
    /// `R`: I, II, III
    UpperRoman,
    /// `r`: i, ii, iii
    LowerRoman,
    /// `A`: A..Z, AA..ZZ
    UpperLetters,
    /// `a`: a..z, aa..zz
    LowerLetters,
    /// No numeric part, prefix only
    None,
}

impl LabelStyle {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"D" => LabelStyle::Decimal,
            b"R" => LabelStyle::UpperRoman,
            b"r" => LabelStyle::LowerRoman,
            b"A" => LabelStyle::UpperLetters,
            b"a" => LabelStyle::LowerLetters,
            _ => LabelStyle::None,
        }
    }

    fn format(self, n: u32) -> String {
        match self {
            LabelStyle::Decimal => n.to_string(),
            LabelStyle::UpperRoman => roman(n),
            LabelStyle::LowerRoman => roman(n).to_lowercase(),
            LabelStyle::UpperLetters => letters(n),
            LabelStyle::LowerLetters => letters(n).to_lowercase(),
            LabelStyle::None => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LabelRange {
    start_index: usize,
    style: LabelStyle,
    prefix: String,
    first: u32,
}

/// The label ranges of a document, sorted by first page.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageLabels {
    ranges: Vec<LabelRange>,
}

impl PageLabels {
    /// Read `/PageLabels` from the catalog. A missing or broken tree yields
    /// no ranges, so every page falls back to its decimal number.
    pub(crate) fn from_catalog(doc: &LopdfDocument, catalog: &Dictionary) -> Self {
        let mut ranges = Vec::new();
        if let Some(root) = dict_get(doc, catalog, b"PageLabels").and_then(|o| match o {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }) {
            collect(doc, root, &mut ranges, 0);
        }
        ranges.sort_by_key(|r| r.start_index);
        ranges.dedup_by_key(|r| r.start_index);
        Self { ranges }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Label of the page at a 0-based index.
    pub(crate) fn label(&self, index: usize) -> String {
        let Some(range) = self.ranges.iter().rev().find(|r| r.start_index <= index) else {
            return (index + 1).to_string();
        };
        let offset = u32::try_from(index - range.start_index).unwrap_or(u32::MAX);
        let value = range.first.saturating_add(offset);
        format!("{}{}", range.prefix, range.style.format(value))
    }

    /// Inverse of [`PageLabels::label`]. Falls back to reading the label
    /// as a 1-based page number.
    pub(crate) fn index_of(&self, label: &str, page_count: usize) -> Option<usize> {
        if !self.is_empty() {
            if let Some(index) = (0..page_count).find(|&i| self.label(i) == label) {
                return Some(index);
            }
        }
        match label.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= page_count => Some(n - 1),
            _ => None,
        }
    }
}

fn collect(doc: &LopdfDocument, node: &Dictionary, ranges: &mut Vec<LabelRange>, depth: usize) {
    if depth > MAX_TREE_DEPTH {
        log::warn!("page label tree too deep, ignoring the rest");
        return;
    }

    if let Some(Object::Array(nums)) = dict_get(doc, node, b"Nums") {
        for pair in nums.chunks_exact(2) {
            let start = resolve(doc, &pair[0]).and_then(|o| o.as_i64().ok());
            let dict = resolve_dict(doc, &pair[1]);
            if let (Some(start), Some(dict)) = (start, dict) {
                if let Ok(start_index) = usize::try_from(start) {
                    ranges.push(parse_range(doc, start_index, dict));
                }
            }
        }
    }

    if let Some(Object::Array(kids)) = dict_get(doc, node, b"Kids") {
        for kid in kids {
            if let Some(kid) = resolve_dict(doc, kid) {
                collect(doc, kid, ranges, depth + 1);
            }
        }
    }
}

fn parse_range(doc: &LopdfDocument, start_index: usize, dict: &Dictionary) -> LabelRange {
    let style = match dict_get(doc, dict, b"S") {
        Some(Object::Name(name)) => LabelStyle::from_name(name),
        _ => LabelStyle::None,
    };
    let first = dict_get(doc, dict, b"St")
        .and_then(|o| o.as_i64().ok())
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n >= 1)
        .unwrap_or(1);
    LabelRange {
        start_index,
        style,
        prefix: text_entry(doc, dict, b"P").unwrap_or_default(),
        first,
    }
}

fn roman(mut n: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// A..Z, then AA..ZZ, AAA.. (the letter repeats).
fn letters(n: u32) -> String {
    if n == 0 {
        return String::new();
    }
    let letter = char::from(b'A' + ((n - 1) % 26) as u8);
    let count = ((n - 1) / 26 + 1) as usize;
    std::iter::repeat(letter).take(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn labels_from(page_labels: Dictionary) -> PageLabels {
        let mut doc = LopdfDocument::with_version("1.5");
        let labels_id = doc.add_object(page_labels);
        let catalog = dictionary! {
            "Type" => "Catalog",
            "PageLabels" => Object::Reference(labels_id),
        };
        PageLabels::from_catalog(&doc, &catalog)
    }

    #[test]
    fn test_roman_and_letters() {
        assert_eq!(roman(1), "I");
        assert_eq!(roman(4), "IV");
        assert_eq!(roman(1994), "MCMXCIV");
        assert_eq!(letters(1), "A");
        assert_eq!(letters(26), "Z");
        assert_eq!(letters(27), "AA");
        assert_eq!(letters(53), "AAA");
    }

    #[test]
    fn test_default_labels_are_page_numbers() {
        let labels = PageLabels::default();
        assert_eq!(labels.label(0), "1");
        assert_eq!(labels.label(9), "10");
        assert_eq!(labels.index_of("3", 5), Some(2));
        assert_eq!(labels.index_of("6", 5), None);
        assert_eq!(labels.index_of("0", 5), None);
    }

    #[test]
    fn test_front_matter_then_decimal() {
        let labels = labels_from(dictionary! {
            "Nums" => vec![
                Object::Integer(0),
                Object::Dictionary(dictionary! { "S" => "r" }),
                Object::Integer(3),
                Object::Dictionary(dictionary! { "S" => "D" }),
                Object::Integer(6),
                Object::Dictionary(dictionary! {
                    "S" => "A",
                    "P" => Object::string_literal("App-"),
                    "St" => Object::Integer(2),
                }),
            ],
        });
        assert_eq!(labels.label(0), "i");
        assert_eq!(labels.label(2), "iii");
        assert_eq!(labels.label(3), "1");
        assert_eq!(labels.label(5), "3");
        assert_eq!(labels.label(6), "App-B");
        assert_eq!(labels.label(7), "App-C");
        assert_eq!(labels.index_of("iii", 8), Some(2));
        assert_eq!(labels.index_of("App-C", 8), Some(7));
    }

    #[test]
    fn test_prefix_only_and_kids() {
        let labels = labels_from(dictionary! {
            "Kids" => vec![Object::Dictionary(dictionary! {
                "Nums" => vec![
                    Object::Integer(0),
                    Object::Dictionary(dictionary! { "P" => Object::string_literal("Cover") }),
                    Object::Integer(1),
                    Object::Dictionary(dictionary! { "S" => "D" }),
                ],
            })],
        });
        assert_eq!(labels.label(0), "Cover");
        assert_eq!(labels.label(1), "1");
    }

    #[test]
    fn test_pages_before_first_range() {
        let labels = labels_from(dictionary! {
            "Nums" => vec![
                Object::Integer(2),
                Object::Dictionary(dictionary! { "S" => "R" }),
            ],
        });
        assert_eq!(labels.label(0), "1");
        assert_eq!(labels.label(2), "I");
    }
}
