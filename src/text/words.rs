//! Grouping glyphs into words and words into lines.

use std::rc::Rc;

use crate::geometry::Rect;
use crate::parser::Glyph;
use crate::text_box::TextBox;

/// Minimum gap, as a fraction of the font size, that separates two words.
pub(crate) const WORD_BREAK_SPACE: f64 = 0.1;
/// Maximum baseline drift, as a fraction of the font size, within a word.
const BASELINE_TOLERANCE: f64 = 0.5;
/// Font size ratio beyond which a word is split.
const MAX_SIZE_RATIO: f64 = 1.25;
/// Backward pen movement, as a fraction of the font size, that ends a word.
const MAX_OVERLAP: f64 = 0.5;
/// Two boxes share a line when their cross-axis extents overlap this much.
pub(crate) const LINE_OVERLAP: f64 = 0.5;

/// A line of words in reading order.
#[derive(Debug, Clone)]
pub(crate) struct TextLine {
    pub words: Vec<TextBox>,
    pub bbox: Rect,
    pub dir: u8,
}

struct WordBuilder {
    text: String,
    boxes: Vec<Rect>,
    font_name: Rc<str>,
    font_size: f64,
    dir: u8,
    baseline: f64,
    end: f64,
}

impl WordBuilder {
    fn start(glyph: &Glyph) -> Self {
        Self {
            text: glyph.text.clone(),
            boxes: vec![glyph.bbox],
            font_name: glyph.font_name.clone(),
            font_size: glyph.font_size,
            dir: glyph.dir,
            baseline: baseline(glyph),
            end: along_end(&glyph.bbox, glyph.dir),
        }
    }

    /// `None` when the glyph continues this word, otherwise whether the
    /// finished word is followed by a space.
    fn break_before(&self, glyph: &Glyph) -> Option<bool> {
        if glyph.dir != self.dir {
            return Some(false);
        }
        let size = self.font_size.max(glyph.font_size);
        if (baseline(glyph) - self.baseline).abs() > BASELINE_TOLERANCE * size {
            return Some(false);
        }
        let gap = along_start(&glyph.bbox, self.dir) - self.end;
        if gap > WORD_BREAK_SPACE * size {
            return Some(true);
        }
        if gap < -MAX_OVERLAP * size {
            return Some(false);
        }
        let smaller = self.font_size.min(glyph.font_size);
        if smaller <= 0.0 || size / smaller > MAX_SIZE_RATIO {
            return Some(false);
        }
        None
    }

    fn push(&mut self, glyph: &Glyph) {
        self.text.push_str(&glyph.text);
        self.boxes.push(glyph.bbox);
        self.end = self.end.max(along_end(&glyph.bbox, self.dir));
    }

    fn finish(self, space_after: bool) -> TextBox {
        let mut word = TextBox::new(
            self.text,
            self.boxes,
            self.font_name.to_string(),
            self.font_size,
            self.dir,
        );
        word.set_space_after(space_after);
        word
    }
}

/// Build words from glyphs, keeping content-stream order.
pub(crate) fn build_words(glyphs: &[Glyph]) -> Vec<TextBox> {
    let mut words = Vec::new();
    let mut current: Option<WordBuilder> = None;

    for glyph in glyphs {
        if glyph.text.is_empty() {
            continue;
        }
        if glyph.is_whitespace() {
            if let Some(word) = current.take() {
                words.push(word.finish(true));
            }
            continue;
        }
        if let Some(mut word) = current.take() {
            match word.break_before(glyph) {
                None => {
                    word.push(glyph);
                    current = Some(word);
                    continue;
                }
                Some(space) => words.push(word.finish(space)),
            }
        }
        current = Some(WordBuilder::start(glyph));
    }

    if let Some(word) = current {
        words.push(word.finish(false));
    }
    words
}

/// Arrange words into lines: lines top to bottom, words along the line.
///
/// `has_space_after` is recomputed from the final order and is always
/// false for the last word of a line.
pub(crate) fn into_lines(words: Vec<TextBox>) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();

    for word in words {
        let best = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.dir == word.dir)
            .map(|(i, line)| (i, across_overlap(&line.bbox, &word.bbox(), word.dir)))
            .filter(|(_, overlap)| *overlap >= LINE_OVERLAP)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        match best {
            Some(i) => {
                let line = &mut lines[i];
                line.bbox = line.bbox.union(&word.bbox());
                line.words.push(word);
            }
            None => lines.push(TextLine {
                bbox: word.bbox(),
                dir: word.dir,
                words: vec![word],
            }),
        }
    }

    for line in &mut lines {
        let dir = line.dir;
        line.words
            .sort_by(|a, b| along_start(&a.bbox(), dir).total_cmp(&along_start(&b.bbox(), dir)));
        let count = line.words.len();
        for i in 0..count {
            let space = if i + 1 == count {
                false
            } else {
                let (cur, next) = (&line.words[i], &line.words[i + 1]);
                let gap = along_start(&next.bbox(), dir) - along_end(&cur.bbox(), dir);
                cur.has_space_after() || gap > WORD_BREAK_SPACE * cur.font_size()
            };
            line.words[i].set_space_after(space);
        }
    }

    lines.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.left.total_cmp(&b.bbox.left))
    });
    lines
}

/// Whether two words sit on the same line.
pub(crate) fn same_line(a: &TextBox, b: &TextBox) -> bool {
    a.dir == b.dir && across_overlap(&a.bbox(), &b.bbox(), a.dir) >= LINE_OVERLAP
}

/// Distance along the writing direction from the end of `a` to the start of `b`.
pub(crate) fn gap_between(a: &TextBox, b: &TextBox) -> f64 {
    along_start(&b.bbox(), a.dir) - along_end(&a.bbox(), a.dir)
}

fn baseline(glyph: &Glyph) -> f64 {
    match glyph.dir {
        0 | 2 => glyph.origin.1,
        _ => glyph.origin.0,
    }
}

fn along_start(r: &Rect, dir: u8) -> f64 {
    match dir {
        0 => r.left,
        1 => r.top,
        2 => -r.right,
        _ => -r.bottom,
    }
}

fn along_end(r: &Rect, dir: u8) -> f64 {
    match dir {
        0 => r.right,
        1 => r.bottom,
        2 => -r.left,
        _ => -r.top,
    }
}

fn across_overlap(a: &Rect, b: &Rect, dir: u8) -> f64 {
    match dir {
        0 | 2 => a.vertical_overlap_ratio(b),
        _ => transpose(a).vertical_overlap_ratio(&transpose(b)),
    }
}

fn transpose(r: &Rect) -> Rect {
    Rect::new(r.top, r.left, r.bottom, r.right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(text: &str, left: f64, baseline: f64, width: f64, size: f64) -> Glyph {
        Glyph {
            text: text.to_string(),
            bbox: Rect::new(left, baseline - 0.8 * size, left + width, baseline + 0.2 * size),
            origin: (left, baseline),
            dir: 0,
            font_size: size,
            font_name: Rc::from("Helvetica"),
        }
    }

    fn run(text: &str, left: f64, baseline: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| glyph(&c.to_string(), left + i as f64 * 6.0, baseline, 6.0, 10.0))
            .collect()
    }

    #[test]
    fn test_space_glyph_splits_words() {
        let words = build_words(&run("ab cd", 0.0, 100.0));
        let texts: Vec<&str> = words.iter().map(|w| w.text()).collect();
        assert_eq!(texts, vec!["ab", "cd"]);
        assert!(words[0].has_space_after());
        assert!(!words[1].has_space_after());
        assert_eq!(words[0].glyph_count(), 2);
    }

    #[test]
    fn test_gap_splits_words() {
        let mut glyphs = run("ab", 0.0, 100.0);
        glyphs.extend(run("cd", 20.0, 100.0));
        let words = build_words(&glyphs);
        assert_eq!(words.len(), 2);
        assert!(words[0].has_space_after());
    }

    #[test]
    fn test_small_gap_keeps_word() {
        let mut glyphs = run("ab", 0.0, 100.0);
        glyphs.extend(run("cd", 12.5, 100.0));
        let words = build_words(&glyphs);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text(), "abcd");
    }

    #[test]
    fn test_baseline_change_splits_words() {
        let mut glyphs = run("ab", 0.0, 100.0);
        glyphs.extend(run("cd", 12.0, 120.0));
        let words = build_words(&glyphs);
        assert_eq!(words.len(), 2);
        assert!(!words[0].has_space_after());
    }

    #[test]
    fn test_font_size_change_splits_words() {
        let mut glyphs = run("ab", 0.0, 100.0);
        glyphs.push(glyph("c", 12.0, 100.0, 12.0, 20.0));
        let words = build_words(&glyphs);
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn test_lines_in_reading_order() {
        // Second line emitted first, words within a line out of order.
        let mut glyphs = run("world", 0.0, 200.0);
        glyphs.extend(run("there", 50.0, 100.0));
        glyphs.extend(run("hello", 0.0, 100.0));
        let lines = into_lines(build_words(&glyphs));
        assert_eq!(lines.len(), 2);
        let first: Vec<&str> = lines[0].words.iter().map(|w| w.text()).collect();
        assert_eq!(first, vec!["hello", "there"]);
        assert!(lines[0].words[0].has_space_after());
        assert!(!lines[0].words[1].has_space_after());
        assert_eq!(lines[1].words[0].text(), "world");
    }

    #[test]
    fn test_same_line_and_gap() {
        let words = build_words(&run("ab cd", 0.0, 100.0));
        assert!(same_line(&words[0], &words[1]));
        assert_eq!(gap_between(&words[0], &words[1]), 6.0);
    }
}
