//! Scan target extraction
//!
//! Selects the part of a URL that patterns are tested against.

use crate::error::{SiftError, SiftResult};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::fmt;
use url::{ParseError, Url};

/// Base used to resolve scheme-less references such as `/admin/login.php?id=1`
const RELATIVE_BASE: &str = "http://linksift.invalid/";

/// Which part of the URL is scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// The input line, unmodified
    #[default]
    Full,
    /// Percent-decoded path
    Path,
    /// Path as it appears on the wire, still percent-encoded
    RawPath,
    /// Last segment of the decoded path
    Filename,
    /// Query string without the leading `?`
    RawQuery,
}

impl ScanMode {
    /// Resolve the scan mode from the CLI switches.
    ///
    /// The switches are mutually exclusive at the argument parser level; if
    /// several are set anyway the first in path, rawpath, filename, rawquery
    /// order wins.
    pub fn from_flags(path: bool, raw_path: bool, filename: bool, raw_query: bool) -> Self {
        if path {
            Self::Path
        } else if raw_path {
            Self::RawPath
        } else if filename {
            Self::Filename
        } else if raw_query {
            Self::RawQuery
        } else {
            Self::Full
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Full => "full URL",
            Self::Path => "path",
            Self::RawPath => "raw path",
            Self::Filename => "filename",
            Self::RawQuery => "raw query",
        };
        f.write_str(name)
    }
}

/// Parse a URL line, resolving relative references against a placeholder base
pub fn parse_url(line: &str) -> SiftResult<Url> {
    let parsed = match Url::parse(line) {
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE).and_then(|base| base.join(line))
        }
        other => other,
    };

    parsed.map_err(|e| SiftError::MalformedUrl {
        url: line.to_string(),
        reason: e.to_string(),
    })
}

/// Extract the scan target of `line` for the given mode.
///
/// The line is parsed in every mode, so a malformed URL is rejected even when
/// the full line would be scanned. Components are sliced out of the line as
/// written: dot segments, quotes and brackets reach the matcher untouched.
pub fn extract(line: &str, mode: ScanMode) -> SiftResult<Cow<'_, str>> {
    parse_url(line)?;

    let (raw_path, raw_query) = split_components(line);

    let target = match mode {
        ScanMode::Full => Cow::Borrowed(line),
        ScanMode::RawPath => Cow::Borrowed(raw_path),
        ScanMode::RawQuery => Cow::Borrowed(raw_query),
        ScanMode::Path => decode(raw_path),
        ScanMode::Filename => match decode(raw_path) {
            Cow::Borrowed(path) => Cow::Borrowed(last_segment(path)),
            Cow::Owned(path) => Cow::Owned(last_segment(&path).to_string()),
        },
    };

    Ok(target)
}

/// Split a URL line into its raw path and raw query, fragment dropped
fn split_components(line: &str) -> (&str, &str) {
    let line = line.split_once('#').map_or(line, |(head, _)| head);
    let (head, query) = line.split_once('?').unwrap_or((line, ""));

    let (has_scheme, rest) = match scheme_len(head) {
        Some(len) => (true, &head[len + 1..]),
        None => (false, head),
    };

    let path = match rest.strip_prefix("//") {
        // Authority runs up to the first '/'
        Some(after) => after.find('/').map_or("", |i| &after[i..]),
        // Opaque forms such as `mailto:a@b` have no path
        None if has_scheme && !rest.starts_with('/') => "",
        None => rest,
    };

    (path, query)
}

/// Length of a leading `scheme` before its `:`, if the line has one
fn scheme_len(head: &str) -> Option<usize> {
    let colon = head.find(':')?;
    let scheme = &head[..colon];
    let mut chars = scheme.chars();

    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    valid.then_some(colon)
}

#[inline]
fn last_segment(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

#[inline]
fn decode(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}
