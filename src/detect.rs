//! PDF header sniffing.
//!
//! Readers accept a `%PDF-x.y` marker anywhere in the first kilobyte of the
//! file, so detection scans a bounded prefix instead of requiring the magic
//! at offset zero.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header information found at the start of a PDF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// Header version (e.g., "1.7", "2.0")
    pub version: String,
    /// Byte offset of the `%PDF-` marker
    pub offset: usize,
    /// Whether a linearization dictionary follows the header
    pub linearized: bool,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;
/// How far into the file the header may start.
const SCAN_WINDOW: usize = 1024;

/// Sniff the header of a PDF file on disk.
pub fn sniff_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let file = File::open(path)?;
    let mut prefix = Vec::with_capacity(SCAN_WINDOW + 64);
    file.take((SCAN_WINDOW + 64) as u64)
        .read_to_end(&mut prefix)?;
    sniff_bytes(&prefix)
}

/// Sniff the header of an in-memory PDF.
///
/// Returns [`Error::UnknownFormat`] when no marker is present in the scan
/// window and [`Error::UnsupportedVersion`] when the version is malformed.
pub fn sniff_bytes(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(SCAN_WINDOW + PDF_MAGIC.len() + VERSION_LEN)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let start = offset + PDF_MAGIC.len();
    let version_bytes = data
        .get(start..start + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    let tail = &data[start..data.len().min(offset + SCAN_WINDOW)];
    let linearized = tail
        .windows(b"/Linearized".len())
        .any(|w| w == b"/Linearized");

    Ok(PdfHeader {
        version,
        offset,
        linearized,
    })
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if a file looks like a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    sniff_path(path).is_ok()
}

/// Check if a byte buffer looks like a PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    sniff_bytes(data).is_ok()
}
