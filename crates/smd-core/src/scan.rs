//! Pure byte-scanning helpers shared by the block and inline passes.
//!
//! Nothing here allocates or writes output.

use memchr::{memchr2, memchr3};

/// Check if `text` contains only whitespace (a bare terminator included).
#[inline]
pub fn is_blank(text: &[u8]) -> bool {
    text.iter().all(|b| b.is_ascii_whitespace())
}

/// Length of the run of `marker` at the start of `text`.
#[inline]
pub fn run_length(text: &[u8], marker: u8) -> usize {
    text.iter().take_while(|&&b| b == marker).count()
}

/// Strip leading spaces and tabs (the terminator is kept).
#[inline]
pub fn skip_blanks(text: &[u8]) -> &[u8] {
    let n = text.iter().take_while(|&&b| b == b' ' || b == b'\t').count();
    &text[n..]
}

/// Strip leading and trailing whitespace, terminator included.
#[inline]
pub fn trim(text: &[u8]) -> &[u8] {
    text.trim_ascii()
}

/// Position of the bracket closing the one at `text[0]`.
///
/// Nested `open`/`close` pairs are counted; returns `None` when the
/// brackets never balance.
pub fn find_matching_close(text: &[u8], open: u8, close: u8) -> Option<usize> {
    debug_assert_eq!(text.first(), Some(&open));
    let mut depth = 1usize;
    let mut pos = 1;
    while let Some(offset) = memchr2(open, close, &text[pos..]) {
        let at = pos + offset;
        if text[at] == open {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(at);
            }
        }
        pos = at + 1;
    }
    None
}

/// Position of the `>` ending the tag that starts at `text[0]`.
///
/// A `>` inside a quoted attribute value does not end the tag; an
/// unterminated quote means there is no tag.
pub fn find_tag_close(text: &[u8]) -> Option<usize> {
    let mut pos = 1;
    while let Some(offset) = memchr3(b'>', b'"', b'\'', &text[pos..]) {
        let at = pos + offset;
        match text[at] {
            b'>' => return Some(at),
            quote => {
                let end = memchr::memchr(quote, &text[at + 1..])?;
                pos = at + 1 + end + 1;
            }
        }
    }
    None
}

/// Strip a code-block indent: four spaces or one tab.
#[inline]
pub fn unindent(text: &[u8]) -> Option<&[u8]> {
    if let Some(rest) = text.strip_prefix(b"    ") {
        Some(rest)
    } else {
        text.strip_prefix(b"\t")
    }
}

/// Width of an ordered-list marker (`12. `) at the start of `text`.
pub fn ordered_marker(text: &[u8]) -> Option<usize> {
    let digits = text.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 && text[digits..].starts_with(b". ") {
        Some(digits + 2)
    } else {
        None
    }
}

/// Level of an ATX heading marker (`## `) at the start of `text`.
pub fn heading_level(text: &[u8]) -> Option<usize> {
    let level = run_length(text, b'#');
    match text.get(level) {
        Some(b' ' | b'\t') if (1..=6).contains(&level) => Some(level),
        _ => None,
    }
}
