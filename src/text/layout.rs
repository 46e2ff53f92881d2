//! Rendering words back into plain text.

use super::words::{gap_between, same_line, TextLine, WORD_BREAK_SPACE};
use crate::text_box::TextBox;

/// Character width used when a page has no measurable glyphs.
const DEFAULT_CHAR_WIDTH: f64 = 6.0;
/// Vertical gap, in line heights, that produces an empty line.
const BLANK_LINE_GAP: f64 = 1.5;

/// Words in content-stream order, one output line per visual line change.
pub(crate) fn raw_text(words: &[TextBox]) -> String {
    let mut out = String::new();
    let mut prev: Option<&TextBox> = None;

    for word in words {
        if let Some(p) = prev {
            if !same_line(p, word) {
                out.push('\n');
            } else if p.has_space_after() || gap_between(p, word) > WORD_BREAK_SPACE * p.font_size()
            {
                out.push(' ');
            }
        }
        out.push_str(word.text());
        prev = Some(word);
    }

    out
}

/// Lines in reading order with horizontal positions kept as columns.
pub(crate) fn physical_text(lines: &[TextLine]) -> String {
    let min_left = lines
        .iter()
        .flat_map(|l| l.words.iter())
        .map(|w| w.bbox().left)
        .fold(f64::INFINITY, f64::min);
    if !min_left.is_finite() {
        return String::new();
    }
    let char_width = median_char_width(lines);

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut prev_line: Option<&TextLine> = None;

    for line in lines {
        if let Some(prev) = prev_line {
            let gap = line.bbox.top - prev.bbox.bottom;
            if gap > BLANK_LINE_GAP * prev.bbox.height() {
                out.push(String::new());
            }
        }

        let mut text = String::new();
        let mut column = 0usize;
        for (i, word) in line.words.iter().enumerate() {
            let wanted = ((word.bbox().left - min_left) / char_width).round().max(0.0) as usize;
            let target = match i.checked_sub(1).map(|p| &line.words[p]) {
                None => wanted,
                Some(prev) if prev.has_space_after() => wanted.max(column + 1),
                Some(_) => column,
            };
            while column < target {
                text.push(' ');
                column += 1;
            }
            text.push_str(word.text());
            column += word.text().chars().count();
        }

        out.push(text.trim_end().to_string());
        prev_line = Some(line);
    }

    out.join("\n")
}

/// Median advance per character over all words.
fn median_char_width(lines: &[TextLine]) -> f64 {
    let mut widths: Vec<f64> = Vec::new();
    for word in lines.iter().flat_map(|l| l.words.iter()) {
        let chars = word.text().chars().count();
        if chars == 0 {
            continue;
        }
        let per_char = word.bbox().width() / chars as f64;
        widths.extend(std::iter::repeat(per_char).take(chars));
    }
    widths.retain(|w| w.is_finite() && *w > 0.0);
    if widths.is_empty() {
        return DEFAULT_CHAR_WIDTH;
    }
    widths.sort_by(f64::total_cmp);
    widths[widths.len() / 2]
}
