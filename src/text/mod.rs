//! Text assembly: glyphs to words, words to lines, lines to text.

mod layout;
mod search;
mod words;

pub(crate) use layout::{physical_text, raw_text};
pub(crate) use search::{find_all, select, TextMatch};
pub(crate) use words::{build_words, into_lines};
