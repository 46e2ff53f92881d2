//! Phrase search over laid-out lines.

use unicode_normalization::UnicodeNormalization;

use super::words::TextLine;
use crate::geometry::Rect;
use crate::page::{CaseSensitivity, SearchDirection};

/// Positions closer than this (in points) count as equal.
const POSITION_EPSILON: f64 = 0.01;

/// One occurrence of the search text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TextMatch {
    /// Union of the matched glyph boxes
    pub bbox: Rect,
    /// Box of the whole line the match sits on
    pub line: Rect,
}

/// Every match of `query`, in reading order.
///
/// Matching works on NFKC-normalised text, one line at a time; a match
/// never spans two lines. Words separated by a space are joined with a
/// single space character, so phrases match across word boundaries.
pub(crate) fn find_all(lines: &[TextLine], query: &str, case: CaseSensitivity) -> Vec<TextMatch> {
    let needle: Vec<char> = normalize(query.chars(), case)
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for line in lines {
        let (chars, boxes) = line_chars(line, case);
        if chars.len() < needle.len() {
            continue;
        }
        for start in 0..=chars.len() - needle.len() {
            let end = start + needle.len();
            if chars[start..end] != needle[..] {
                continue;
            }
            let bbox = boxes[start..end]
                .iter()
                .flatten()
                .copied()
                .reduce(|acc, r| acc.union(&r));
            if let Some(bbox) = bbox {
                matches.push(TextMatch {
                    bbox,
                    line: line.bbox,
                });
            }
        }
    }
    matches
}

/// Index of the match a search step lands on.
///
/// `matches` must be in reading order. An anchor equal to one of the
/// matches steps to its neighbour in that order; any other anchor is
/// placed by position: its vertical centre picks the line, its left edge
/// the spot within the line.
pub(crate) fn select(matches: &[TextMatch], anchor: &Rect, direction: SearchDirection) -> Option<usize> {
    if matches.is_empty() {
        return None;
    }
    let current = matches.iter().position(|m| same_rect(&m.bbox, anchor));

    match (direction, current) {
        (SearchDirection::FromTop, _) => Some(0),
        (SearchDirection::NextResult, Some(i)) => (i + 1 < matches.len()).then_some(i + 1),
        (SearchDirection::PreviousResult, Some(i)) => i.checked_sub(1),
        (SearchDirection::NextResult, None) => matches.iter().position(|m| is_after(m, anchor)),
        (SearchDirection::PreviousResult, None) => {
            matches.iter().rposition(|m| is_before(m, anchor))
        }
    }
}

fn same_rect(a: &Rect, b: &Rect) -> bool {
    (a.left - b.left).abs() <= POSITION_EPSILON
        && (a.top - b.top).abs() <= POSITION_EPSILON
        && (a.right - b.right).abs() <= POSITION_EPSILON
        && (a.bottom - b.bottom).abs() <= POSITION_EPSILON
}

fn on_line(m: &TextMatch, y: f64) -> bool {
    y >= m.line.top && y <= m.line.bottom
}

/// Whether `m` comes after the position of `anchor`.
fn is_after(m: &TextMatch, anchor: &Rect) -> bool {
    let (_, y) = anchor.center();
    if on_line(m, y) {
        m.bbox.left > anchor.left + POSITION_EPSILON
    } else {
        m.line.top > y
    }
}

/// Whether `m` comes before the position of `anchor`.
fn is_before(m: &TextMatch, anchor: &Rect) -> bool {
    let (_, y) = anchor.center();
    if on_line(m, y) {
        m.bbox.left < anchor.left - POSITION_EPSILON
    } else {
        m.line.bottom < y
    }
}

/// Normalised characters of a line, each with the box of the glyph it came from.
fn line_chars(line: &TextLine, case: CaseSensitivity) -> (Vec<char>, Vec<Option<Rect>>) {
    let mut chars = Vec::new();
    let mut boxes = Vec::new();

    for (i, word) in line.words.iter().enumerate() {
        if i > 0 && line.words[i - 1].has_space_after() {
            chars.push(' ');
            boxes.push(None);
        }
        let source: Vec<char> = word.text().chars().collect();
        let glyphs = word.char_boxes();
        for (ci, c) in source.iter().enumerate() {
            // Glyph and character counts differ for ligatures.
            let bbox = if glyphs.is_empty() {
                word.bbox()
            } else {
                glyphs[(ci * glyphs.len() / source.len()).min(glyphs.len() - 1)]
            };
            for n in normalize(std::iter::once(*c), case) {
                chars.push(n);
                boxes.push(Some(bbox));
            }
        }
    }

    (chars, boxes)
}

fn normalize<I>(chars: I, case: CaseSensitivity) -> impl Iterator<Item = char>
where
    I: Iterator<Item = char>,
{
    chars.nfkc().flat_map(move |c| match case {
        CaseSensitivity::CaseSensitive => vec![c],
        CaseSensitivity::CaseInsensitive => c.to_lowercase().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Glyph;
    use crate::text::words::{build_words, into_lines};
    use std::rc::Rc;

    fn run(text: &str, left: f64, baseline: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let x = left + i as f64 * 5.0;
                Glyph {
                    text: c.to_string(),
                    bbox: Rect::new(x, baseline - 8.0, x + 5.0, baseline + 2.0),
                    origin: (x, baseline),
                    dir: 0,
                    font_size: 10.0,
                    font_name: Rc::from("Helvetica"),
                }
            })
            .collect()
    }

    fn sample() -> Vec<TextLine> {
        let mut glyphs = run("the cat and the dog", 0.0, 100.0);
        glyphs.extend(run("The end", 0.0, 120.0));
        into_lines(build_words(&glyphs))
    }

    fn boxes(matches: &[TextMatch]) -> Vec<Rect> {
        matches.iter().map(|m| m.bbox).collect()
    }

    #[test]
    fn test_find_all_case_sensitive() {
        let found = find_all(&sample(), "the", CaseSensitivity::CaseSensitive);
        assert_eq!(
            boxes(&found),
            vec![Rect::new(0.0, 92.0, 15.0, 102.0), Rect::new(60.0, 92.0, 75.0, 102.0)]
        );
        assert_eq!(found[0].line, Rect::new(0.0, 92.0, 95.0, 102.0));
    }

    #[test]
    fn test_find_all_case_insensitive() {
        let found = find_all(&sample(), "THE", CaseSensitivity::CaseInsensitive);
        assert_eq!(found.len(), 3);
        assert_eq!(found[2].bbox.top, 112.0);
    }

    #[test]
    fn test_phrase_across_words() {
        let found = find_all(&sample(), "cat and", CaseSensitivity::CaseSensitive);
        assert_eq!(boxes(&found), vec![Rect::new(20.0, 92.0, 55.0, 102.0)]);
    }

    #[test]
    fn test_no_match_across_lines() {
        assert!(find_all(&sample(), "dog The", CaseSensitivity::CaseSensitive).is_empty());
        assert!(find_all(&sample(), "", CaseSensitivity::CaseSensitive).is_empty());
    }

    #[test]
    fn test_compatibility_forms_match() {
        let lines = into_lines(build_words(&run("\u{FB01}ne", 0.0, 100.0)));
        let found = find_all(&lines, "fine", CaseSensitivity::CaseSensitive);
        assert_eq!(boxes(&found), vec![Rect::new(0.0, 92.0, 15.0, 102.0)]);
    }

    #[test]
    fn test_select_steps_through_matches() {
        let matches = find_all(&sample(), "the", CaseSensitivity::CaseInsensitive);
        let at = |i: usize| matches[i].bbox;
        assert_eq!(select(&matches, &Rect::default(), SearchDirection::FromTop), Some(0));

        assert_eq!(select(&matches, &at(0), SearchDirection::NextResult), Some(1));
        assert_eq!(select(&matches, &at(1), SearchDirection::NextResult), Some(2));
        assert_eq!(select(&matches, &at(2), SearchDirection::NextResult), None);

        assert_eq!(select(&matches, &at(2), SearchDirection::PreviousResult), Some(1));
        assert_eq!(select(&matches, &at(0), SearchDirection::PreviousResult), None);
        assert_eq!(select(&[], &at(0), SearchDirection::FromTop), None);
    }

    #[test]
    fn test_select_from_arbitrary_anchor() {
        let matches = find_all(&sample(), "the", CaseSensitivity::CaseInsensitive);

        // Page origin: everything is after it.
        assert_eq!(select(&matches, &Rect::default(), SearchDirection::NextResult), Some(0));
        assert_eq!(select(&matches, &Rect::default(), SearchDirection::PreviousResult), None);

        // Between the two matches of the first line.
        let between = Rect::new(30.0, 95.0, 31.0, 99.0);
        assert_eq!(select(&matches, &between, SearchDirection::NextResult), Some(1));
        assert_eq!(select(&matches, &between, SearchDirection::PreviousResult), Some(0));

        // Below the last line.
        let below = Rect::new(0.0, 300.0, 1.0, 301.0);
        assert_eq!(select(&matches, &below, SearchDirection::NextResult), None);
        assert_eq!(select(&matches, &below, SearchDirection::PreviousResult), Some(2));
    }

    #[test]
    fn test_select_mixed_sizes_on_one_line() {
        // A larger second word has a smaller top but still follows the first.
        let mut glyphs = run("apple ", 0.0, 100.0);
        glyphs.extend("apple".chars().enumerate().map(|(i, c)| {
            let x = 40.0 + i as f64 * 10.0;
            Glyph {
                text: c.to_string(),
                bbox: Rect::new(x, 84.0, x + 10.0, 104.0),
                origin: (x, 100.0),
                dir: 0,
                font_size: 20.0,
                font_name: Rc::from("Helvetica"),
            }
        }));
        let lines = into_lines(build_words(&glyphs));
        assert_eq!(lines.len(), 1);

        let matches = find_all(&lines, "apple", CaseSensitivity::CaseSensitive);
        assert_eq!(matches.len(), 2);
        assert!(matches[1].bbox.top < matches[0].bbox.top);

        let first = matches[0].bbox;
        assert_eq!(select(&matches, &first, SearchDirection::NextResult), Some(1));
        assert_eq!(select(&matches, &matches[1].bbox, SearchDirection::PreviousResult), Some(0));
    }
}
