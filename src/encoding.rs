//! Line source for URL and pattern files
//!
//! Reads files through a memory map, detects their encoding and transcodes
//! each line to UTF-8.

use crate::error::{SiftError, SiftResult};
use bytesize::ByteSize;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use std::fs::File;
use std::path::Path;

/// Bytes sampled for encoding detection
const DETECTION_SAMPLE: usize = 64 * 1024;

/// Result of encoding detection
#[derive(Debug, Clone)]
pub struct EncodingInfo {
    /// Detected encoding name
    pub name: &'static str,
    /// The encoding_rs Encoding reference
    pub encoding: &'static Encoding,
}

impl Default for EncodingInfo {
    fn default() -> Self {
        Self {
            name: "UTF-8",
            encoding: encoding_rs::UTF_8,
        }
    }
}

/// Detect the encoding of a byte sample
pub fn detect_encoding(sample: &[u8]) -> EncodingInfo {
    if sample.is_empty() {
        return EncodingInfo::default();
    }

    if let Some(encoding) = detect_bom(sample) {
        return EncodingInfo {
            name: encoding.name(),
            encoding,
        };
    }

    // URL lists are nearly always ASCII or UTF-8; only ask chardetng otherwise
    match std::str::from_utf8(sample) {
        Ok(_) => return EncodingInfo::default(),
        // Sample cut inside a multi-byte sequence
        Err(e) if e.error_len().is_none() => return EncodingInfo::default(),
        Err(_) => {}
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    let encoding = detector.guess(None, true);

    EncodingInfo {
        name: encoding.name(),
        encoding,
    }
}

/// Detect BOM (Byte Order Mark) at the start of content
fn detect_bom(content: &[u8]) -> Option<&'static Encoding> {
    if content.len() >= 3 && content[0..3] == [0xEF, 0xBB, 0xBF] {
        return Some(encoding_rs::UTF_8);
    }
    if content.len() >= 2 {
        if content[0..2] == [0xFE, 0xFF] {
            return Some(encoding_rs::UTF_16BE);
        }
        if content[0..2] == [0xFF, 0xFE] {
            return Some(encoding_rs::UTF_16LE);
        }
    }
    None
}

/// Memory-mapped line iterator
pub struct MmapLineIterator {
    mmap: Option<memmap2::Mmap>,
    encoding: &'static Encoding,
    position: usize,
}

impl MmapLineIterator {
    /// Map `path` and prepare to iterate its lines
    pub fn new(path: &Path) -> SiftResult<Self> {
        let unreadable = |source| SiftError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unreadable)?;
        let len = file.metadata().map_err(unreadable)?.len();

        if len == 0 {
            return Ok(Self {
                mmap: None,
                encoding: encoding_rs::UTF_8,
                position: 0,
            });
        }

        // Safety: the file is opened read-only and only read for the lifetime of the map
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(unreadable)?;

        let sample_len = mmap.len().min(DETECTION_SAMPLE);
        let info = detect_encoding(&mmap[..sample_len]);

        // Skip BOM if present
        let position = if mmap.len() >= 3 && mmap[0..3] == [0xEF, 0xBB, 0xBF] {
            3
        } else if mmap.len() >= 2 && (mmap[0..2] == [0xFE, 0xFF] || mmap[0..2] == [0xFF, 0xFE]) {
            2
        } else {
            0
        };

        Ok(Self {
            mmap: Some(mmap),
            encoding: info.encoding,
            position,
        })
    }

    /// Get the total size of the file
    pub fn size(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }

    /// Get the detected encoding
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

impl Iterator for MmapLineIterator {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let mmap = self.mmap.as_ref()?;
        if self.position >= mmap.len() {
            return None;
        }

        // UTF-16 cannot be split on a single 0x0A byte; decode the rest at once
        if self.encoding == encoding_rs::UTF_16LE || self.encoding == encoding_rs::UTF_16BE {
            let (decoded, _) = self.encoding.decode_without_bom_handling(&mmap[self.position..]);
            self.position = mmap.len();
            return Some(decoded.into_owned());
        }

        let remaining = &mmap[self.position..];
        let line_end = memchr::memchr(b'\n', remaining)
            .map(|i| i + 1)
            .unwrap_or(remaining.len());

        let line_bytes = &remaining[..line_end];
        self.position += line_end;

        let line_bytes = line_bytes.strip_suffix(b"\n").unwrap_or(line_bytes);
        let line_bytes = line_bytes.strip_suffix(b"\r").unwrap_or(line_bytes);

        if self.encoding == encoding_rs::UTF_8 {
            Some(String::from_utf8_lossy(line_bytes).into_owned())
        } else {
            let (decoded, had_errors) = self.encoding.decode_without_bom_handling(line_bytes);
            if had_errors {
                log::warn!("Encoding errors in line, using lossy conversion");
            }
            Some(decoded.into_owned())
        }
    }
}

/// Read every non-empty line of a file.
///
/// Lines are kept as written apart from the line terminator, so leading or
/// trailing spaces stay part of a pattern. Lines are returned in file order;
/// deduplication is left to the caller.
pub fn read_lines(path: &Path) -> SiftResult<Vec<String>> {
    let iter = MmapLineIterator::new(path)?;
    log::debug!(
        "Reading {:?} ({}, {})",
        path,
        ByteSize(iter.size() as u64),
        iter.encoding().name()
    );

    let mut lines = Vec::new();
    for chunk in iter {
        // UTF-16 input arrives as one decoded chunk
        for line in chunk.lines() {
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
    }

    Ok(lines)
}
