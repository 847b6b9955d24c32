//! Byte-range edits over SVG markup.
//!
//! The document is never re-serialized from a tree. Instead every mutation is expressed as a set
//! of splices against the current text, located through a `roxmltree` parse of that same text.
//! Bytes outside the spliced ranges are carried over verbatim.

use std::ops::Range;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Splice {
    pub(crate) range: Range<usize>,
    pub(crate) text: String,
}

impl Splice {
    pub(crate) fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub(crate) fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            text: text.into(),
        }
    }
}

/// Applies non-overlapping splices to `source`.
///
/// Inserts at the same offset keep their relative order.
pub(crate) fn apply(source: &str, mut splices: Vec<Splice>) -> String {
    if splices.is_empty() {
        return source.to_string();
    }
    splices.sort_by_key(|s| (s.range.start, s.range.end));

    let extra: usize = splices.iter().map(|s| s.text.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut cursor = 0usize;
    for splice in splices {
        if splice.range.start < cursor {
            debug_assert!(false, "overlapping splice at {:?}", splice.range);
            continue;
        }
        out.push_str(&source[cursor..splice.range.start]);
        out.push_str(&splice.text);
        cursor = splice.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Escapes a value for use inside a double-quoted attribute.
pub(crate) fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders `name="value"` with the value escaped.
pub(crate) fn attr(name: &str, value: &str) -> String {
    format!(r#"{name}="{}""#, escape_attr(value))
}

/// Returns the byte offset just past the qualified name of the start tag beginning at `lt`.
pub(crate) fn start_tag_name_end(source: &str, lt: usize) -> usize {
    let bytes = source.as_bytes();
    let mut i = lt + 1;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' | b'/' | b'>' => break,
            _ => i += 1,
        }
    }
    i
}

/// Returns the qualified name of the start tag beginning at `lt`.
pub(crate) fn start_tag_name(source: &str, lt: usize) -> &str {
    &source[lt + 1..start_tag_name_end(source, lt)]
}

/// Parses a root `width`/`height` into user units.
///
/// Absolute units are converted at 96 DPI. Percentages and font-relative units depend on a
/// context the document does not have, so they are rejected along with non-positive values.
pub(crate) fn parse_length(s: &str) -> Option<f64> {
    use svgtypes::LengthUnit as Unit;

    let length = svgtypes::Length::from_str(s.trim()).ok()?;
    let factor = match length.unit {
        Unit::None | Unit::Px => 1.0,
        Unit::In => 96.0,
        Unit::Cm => 96.0 / 2.54,
        Unit::Mm => 96.0 / 25.4,
        Unit::Pt => 4.0 / 3.0,
        Unit::Pc => 16.0,
        // Em, Ex and Percent
        _ => return None,
    };
    let v = length.number * factor;
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Parses the integer prefix of `s`, the way a browser's `parseInt(s, 10)` does.
pub(crate) fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0usize;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<i64>().ok()
}
