//! Text helpers shared by the markup core
//!
//! Offsets in this crate are byte offsets into UTF-8 text. Positions coming
//! from the outside (cursor positions, click positions) may land inside a
//! multi-byte character, so every slice goes through the boundary helpers
//! here first.
//!
//! # Example
//! ```ignore
//! use docsync::string_utils::{safe_slice, escape_markup, line_of_offset};
//!
//! let text = "Hei på deg";
//! let slice = safe_slice(text, 4, 7); // "på", even though 6 is mid-char
//! let escaped = escape_markup("a < b"); // "a &lt; b"
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Character Boundary Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the largest index `<= index` that is on a UTF-8 character boundary.
///
/// Indices past the end clamp to `s.len()`.
#[inline]
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Returns the smallest index `>= index` that is on a UTF-8 character boundary.
///
/// Indices past the end clamp to `s.len()`.
#[inline]
pub fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Safely slice a string, flooring `start` and ceiling `end` to character
/// boundaries. Returns `""` when the adjusted range is empty.
#[inline]
pub fn safe_slice(s: &str, start: usize, end: usize) -> &str {
    let start = floor_char_boundary(s, start);
    let end = ceil_char_boundary(s, end);

    if start >= end {
        return "";
    }

    &s[start..end]
}

// ─────────────────────────────────────────────────────────────────────────────
// Word Boundaries
// ─────────────────────────────────────────────────────────────────────────────

/// Characters that end a word for highlight snapping.
pub const WORD_BOUNDARY_CHARS: [char; 8] = [' ', '\t', '\n', '.', ',', ';', '?', '!'];

/// Check if a character terminates a word.
#[inline]
pub fn is_word_boundary(c: char) -> bool {
    WORD_BOUNDARY_CHARS.contains(&c)
}

/// Expand `offset` within `text` to the surrounding word.
///
/// Returns the byte range `(start, end)` with `start <= offset <= end`.
/// The range is empty when `offset` sits between two boundary characters.
pub fn word_range_at(text: &str, offset: usize) -> (usize, usize) {
    let offset = floor_char_boundary(text, offset);

    let start = text[..offset]
        .char_indices()
        .rev()
        .find(|(_, c)| is_word_boundary(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);

    let end = text[offset..]
        .char_indices()
        .find(|(_, c)| is_word_boundary(*c))
        .map(|(i, _)| offset + i)
        .unwrap_or(text.len());

    (start, end)
}

// ─────────────────────────────────────────────────────────────────────────────
// Escaping
// ─────────────────────────────────────────────────────────────────────────────

/// Escape the characters that would change the meaning of markup text.
///
/// Only `&`, `<` and `>` are touched; quotes are left alone since run
/// content never lands inside an attribute value.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Length in bytes of `escape_markup(&text[..index])`.
///
/// Used to carry a cursor position through escaping.
pub fn escaped_len_before(text: &str, index: usize) -> usize {
    let index = floor_char_boundary(text, index);
    text[..index]
        .chars()
        .map(|c| match c {
            '&' => 5,
            '<' | '>' => 4,
            _ => c.len_utf8(),
        })
        .sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Conversion Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Get the 1-indexed line containing a byte offset.
pub fn line_of_offset(text: &str, offset: usize) -> usize {
    let offset = floor_char_boundary(text, offset);
    text.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Get the byte offset where a 1-indexed line starts.
///
/// Lines past the end map to `text.len()`.
pub fn offset_of_line(text: &str, line: usize) -> usize {
    if line <= 1 {
        return 0;
    }
    text.match_indices('\n')
        .nth(line - 2)
        .map(|(i, _)| i + 1)
        .unwrap_or(text.len())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
