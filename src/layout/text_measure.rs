//! Text Measurement
//!
//! Intrinsic content size of text-like widgets, in terminal cells.
//!
//! Terminal text width depends on Unicode character widths:
//! - ASCII characters: 1 cell
//! - CJK characters: 2 cells (fullwidth)
//! - Zero-width characters: 0 cells

use unicode_width::UnicodeWidthStr;

use super::types::ContentSize;

/// Measure the display width of a single line in terminal cells.
#[inline]
pub fn string_width(s: &str) -> i32 {
    UnicodeWidthStr::width(s) as i32
}

/// Measure multi-line text: one row per line, width of the longest line.
///
/// Empty text measures as zero by zero.
pub fn measure_content(text: &str) -> ContentSize {
    if text.is_empty() {
        return ContentSize::default();
    }

    let mut size = ContentSize::default();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        size.width = size.width.max(string_width(line));
        size.height += 1;
    }
    size
}

/// Measure a list of single-line items: one row per item.
pub fn measure_items<S: AsRef<str>>(items: &[S]) -> ContentSize {
    ContentSize {
        width: items.iter().map(|i| string_width(i.as_ref())).max().unwrap_or(0),
        height: items.len() as i32,
    }
}
