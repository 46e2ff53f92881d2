//! `/ToUnicode` CMap parsing.
//!
//! Only the parts needed for text extraction are understood: `bfchar`,
//! `bfrange` (both the incrementing and the array form) and
//! `codespacerange`. Everything else in the CMap program is skipped.

use std::collections::HashMap;

/// Mapping from character codes to Unicode text.
#[derive(Debug, Clone, Default)]
pub(crate) struct ToUnicodeMap {
    chars: HashMap<u32, String>,
    ranges: Vec<BfRange>,
    /// Code byte lengths declared by `codespacerange`
    code_lengths: Vec<usize>,
}

#[derive(Debug, Clone)]
struct BfRange {
    low: u32,
    high: u32,
    target: RangeTarget,
}

#[derive(Debug, Clone)]
enum RangeTarget {
    /// UTF-16 units whose last unit is incremented across the range
    Increment(Vec<u16>),
    /// One destination string per code
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Name(String),
    Word(String),
    Number(i64),
    ArrayStart,
    ArrayEnd,
}

impl ToUnicodeMap {
    /// Parse a CMap program.
    pub(crate) fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut map = ToUnicodeMap::default();
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "begincodespacerange" => {
                    i += 1;
                    while let (Some(Token::Hex(low)), Some(Token::Hex(_))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        if !map.code_lengths.contains(&low.len()) {
                            map.code_lengths.push(low.len());
                        }
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(dst)) = (tokens.get(i), tokens.get(i + 1))
                    {
                        if let Some(text) = destination_text(dst) {
                            map.chars.insert(code_value(src), text);
                        }
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    while let (Some(Token::Hex(low)), Some(Token::Hex(high))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        let (low, high) = (code_value(low), code_value(high));
                        i += 2;
                        match tokens.get(i) {
                            Some(Token::Hex(dst)) => {
                                map.ranges.push(BfRange {
                                    low,
                                    high,
                                    target: RangeTarget::Increment(utf16_units(dst)),
                                });
                                i += 1;
                            }
                            Some(Token::ArrayStart) => {
                                i += 1;
                                let mut list = Vec::new();
                                while let Some(token) = tokens.get(i) {
                                    i += 1;
                                    match token {
                                        Token::ArrayEnd => break,
                                        other => {
                                            list.push(destination_text(other).unwrap_or_default())
                                        }
                                    }
                                }
                                map.ranges.push(BfRange {
                                    low,
                                    high,
                                    target: RangeTarget::List(list),
                                });
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        map.code_lengths.sort_unstable();
        map
    }

    /// Look up the text for a character code.
    pub(crate) fn lookup(&self, code: u32) -> Option<String> {
        if let Some(text) = self.chars.get(&code) {
            return Some(text.clone());
        }
        self.ranges
            .iter()
            .rev()
            .find(|r| code >= r.low && code <= r.high)
            .and_then(|r| {
                let offset = code - r.low;
                match &r.target {
                    RangeTarget::Increment(units) => {
                        let mut units = units.clone();
                        let last = units.last_mut()?;
                        *last = last.wrapping_add(offset as u16);
                        Some(String::from_utf16_lossy(&units))
                    }
                    RangeTarget::List(list) => list.get(offset as usize).cloned(),
                }
            })
    }

    /// Code lengths (in bytes) declared by the CMap, shortest first.
    pub(crate) fn code_lengths(&self) -> &[usize] {
        &self.code_lengths
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.ranges.is_empty()
    }
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    let mut units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect();
    if units.is_empty() {
        units.push(0);
    }
    units
}

fn destination_text(token: &Token) -> Option<String> {
    match token {
        Token::Hex(bytes) => Some(String::from_utf16_lossy(&utf16_units(bytes))),
        Token::Name(name) => glyph_name_to_text(name),
        Token::Number(n) => char::from_u32(*n as u32).map(String::from),
        _ => None,
    }
}

/// Map the handful of glyph names seen in bfchar destinations.
fn glyph_name_to_text(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix("uni") {
        let units: Option<Vec<u16>> = hex
            .as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).ok().and_then(|s| u16::from_str_radix(s, 16).ok()))
            .collect();
        return units.map(|u| String::from_utf16_lossy(&u));
    }
    match name {
        "space" => Some(" ".to_string()),
        "fi" => Some("fi".to_string()),
        "fl" => Some("fl".to_string()),
        "ff" => Some("ff".to_string()),
        _ if name.chars().count() == 1 => Some(name.to_string()),
        _ => None,
    }
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let b = data[i];
        match b {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                i += 1;
                let mut digits = Vec::new();
                while i < data.len() && data[i] != b'>' {
                    if data[i].is_ascii_hexdigit() {
                        digits.push(data[i]);
                    }
                    i += 1;
                }
                i += 1;
                if digits.len() % 2 == 1 {
                    digits.push(b'0');
                }
                let bytes = digits
                    .chunks(2)
                    .filter_map(|pair| {
                        std::str::from_utf8(pair)
                            .ok()
                            .and_then(|s| u8::from_str_radix(s, 16).ok())
                    })
                    .collect();
                tokens.push(Token::Hex(bytes));
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'(' => {
                // Literal strings never carry mapping data; skip them.
                let mut depth = 0usize;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
            }
            b'/' => {
                let start = i + 1;
                i = start;
                while i < data.len() && is_regular(data[i]) {
                    i += 1;
                }
                tokens.push(Token::Name(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
            _ if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len() && is_regular(data[i]) {
                    i += 1;
                }
                if i == start {
                    i += 1;
                    continue;
                }
                let word = String::from_utf8_lossy(&data[start..i]).into_owned();
                match word.parse::<i64>() {
                    Ok(n) => tokens.push(Token::Number(n)),
                    Err(_) => tokens.push(Token::Word(word)),
                }
            }
        }
    }

    tokens
}

fn is_regular(b: u8) -> bool {
    !b.is_ascii_whitespace() && !b"()<>[]{}/%".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <00660069>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0030> <0031> [<0078> <0079>]
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn test_bfchar() {
        let map = ToUnicodeMap::parse(SAMPLE);
        assert_eq!(map.lookup(0x0003).as_deref(), Some(" "));
        assert_eq!(map.lookup(0x0011).as_deref(), Some("fi"));
    }

    #[test]
    fn test_bfrange_increment() {
        let map = ToUnicodeMap::parse(SAMPLE);
        assert_eq!(map.lookup(0x0024).as_deref(), Some("A"));
        assert_eq!(map.lookup(0x0026).as_deref(), Some("C"));
        assert_eq!(map.lookup(0x0027), None);
    }

    #[test]
    fn test_bfrange_array() {
        let map = ToUnicodeMap::parse(SAMPLE);
        assert_eq!(map.lookup(0x0030).as_deref(), Some("x"));
        assert_eq!(map.lookup(0x0031).as_deref(), Some("y"));
    }

    #[test]
    fn test_codespace_lengths() {
        let map = ToUnicodeMap::parse(SAMPLE);
        assert_eq!(map.code_lengths(), &[2]);
        assert!(!map.is_empty());
    }

    #[test]
    fn test_empty_program() {
        let map = ToUnicodeMap::parse(b"begincmap endcmap");
        assert!(map.is_empty());
        assert_eq!(map.lookup(65), None);
    }
}
