//! Streaming inline renderer.
//!
//! Scans a span left to right and writes HTML as it goes. There is no
//! inline tree: emphasis content is rendered by recursing on the inner
//! slice, and every construct that fails to close is written back out as
//! literal, escaped text.

use std::io::{self, Write};

use memchr::{memchr, memchr3};

use crate::escape::write_escaped;
use crate::scan::{find_matching_close, find_tag_close, run_length};

/// Maximum nesting of emphasis and link titles rendered recursively.
/// Content nested deeper is written as escaped text.
pub const MAX_NESTING: usize = 128;

/// Render the inline content of `text` as HTML.
pub fn render<W: Write + ?Sized>(out: &mut W, text: &[u8]) -> io::Result<()> {
    render_nested(out, text, 0)
}

fn render_nested<W: Write + ?Sized>(out: &mut W, text: &[u8], depth: usize) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    InlineRenderer {
        out,
        text,
        pos: 0,
        depth,
    }
    .render()
}

/// The constructs opened by a delimiter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    /// `` ` `` to ``` ``` ```: code span, content copied escaped.
    Code,
    /// `*` to `***`: emphasis, strong, or both; content rendered recursively.
    Emphasis,
    /// `$` or `$$`: inline or display math, content copied escaped.
    Math,
}

impl Delimiter {
    fn marker(self) -> u8 {
        match self {
            Delimiter::Code => b'`',
            Delimiter::Emphasis => b'*',
            Delimiter::Math => b'$',
        }
    }

    fn max_len(self) -> usize {
        match self {
            Delimiter::Code | Delimiter::Emphasis => 3,
            Delimiter::Math => 2,
        }
    }

    /// Content may not start or end with whitespace.
    fn is_tight(self) -> bool {
        !matches!(self, Delimiter::Code)
    }

    /// The run may sit between two alphanumerics.
    fn allows_intraword(self) -> bool {
        !matches!(self, Delimiter::Math)
    }

    fn nests(self) -> bool {
        matches!(self, Delimiter::Emphasis)
    }

    fn tags(self, len: usize) -> (&'static str, &'static str) {
        match (self, len) {
            (Delimiter::Code, _) => ("<code>", "</code>"),
            (Delimiter::Emphasis, 1) => ("<em>", "</em>"),
            (Delimiter::Emphasis, 2) => ("<strong>", "</strong>"),
            (Delimiter::Emphasis, _) => ("<em><strong>", "</strong></em>"),
            (Delimiter::Math, 1) => ("\\(", "\\)"),
            (Delimiter::Math, _) => ("\\[", "\\]"),
        }
    }
}

struct InlineRenderer<'a, W: ?Sized> {
    out: &'a mut W,
    text: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a, W: Write + ?Sized> InlineRenderer<'a, W> {
    fn render(&mut self) -> io::Result<()> {
        while self.pos < self.text.len() {
            let next = self.find_next_special();
            write_escaped(self.out, &self.text[self.pos..next])?;
            self.pos = next;

            if next >= self.text.len() {
                break;
            }

            let handled = match self.text[next] {
                b'\\' => self.try_backslash()?,
                b'`' => self.try_delimited(Delimiter::Code)?,
                b'*' => self.try_delimited(Delimiter::Emphasis)?,
                b'$' => self.try_delimited(Delimiter::Math)?,
                b'[' => self.try_link()?,
                b'!' => self.try_image()?,
                b'<' => self.try_tag()?,
                _ => false,
            };

            if !handled {
                write_escaped(self.out, &self.text[next..next + 1])?;
                self.pos = next + 1;
            }
        }
        Ok(())
    }

    /// Render a nested span, falling back to escaped text past the bound.
    fn render_inner(&mut self, inner: &[u8]) -> io::Result<()> {
        if self.depth >= MAX_NESTING {
            write_escaped(self.out, inner)
        } else {
            render_nested(self.out, inner, self.depth + 1)
        }
    }

    #[inline(always)]
    fn find_next_special(&self) -> usize {
        let remaining = &self.text[self.pos..];

        let common = memchr3(b'*', b'`', b'[', remaining);
        let rare = memchr3(b'\\', b'$', b'<', remaining);
        let bang = memchr(b'!', remaining);

        [common, rare, bang]
            .into_iter()
            .flatten()
            .min()
            .map_or(self.text.len(), |offset| self.pos + offset)
    }

    fn try_backslash(&mut self) -> io::Result<bool> {
        match self.text.get(self.pos + 1) {
            Some(b'\n') => {
                self.out.write_all(b"<br>\n")?;
                self.pos += 2;
            }
            Some(&c) if c.is_ascii_punctuation() => {
                write_escaped(self.out, &[c])?;
                self.pos += 2;
            }
            _ => {
                self.out.write_all(b"\\")?;
                self.pos += 1;
            }
        }
        Ok(true)
    }

    /// Match the run at `pos` against a later run of the same length.
    ///
    /// Candidate lengths are tried longest first; the first closing run of
    /// exactly that length decides whether the length is accepted.
    fn try_delimited(&mut self, kind: Delimiter) -> io::Result<bool> {
        let start = self.pos;
        let marker = kind.marker();
        let run = run_length(&self.text[start..], marker);
        let after = start + run;
        let word_before = start > 0 && self.text[start - 1].is_ascii_alphanumeric();

        if kind.allows_intraword() || !word_before {
            for len in (1..=run.min(kind.max_len())).rev() {
                if kind.is_tight() && self.text.get(start + len).map_or(true, u8::is_ascii_whitespace)
                {
                    continue;
                }
                let Some(close) = self.find_closing_run(after, marker, len) else {
                    continue;
                };
                if kind.is_tight() && self.text[close - 1].is_ascii_whitespace() {
                    continue;
                }
                if !kind.allows_intraword()
                    && self
                        .text
                        .get(close + len)
                        .is_some_and(u8::is_ascii_alphanumeric)
                {
                    continue;
                }

                let (open_tag, close_tag) = kind.tags(len);
                let text = self.text;
                let inner = &text[start + len..close];
                self.out.write_all(open_tag.as_bytes())?;
                if kind.nests() {
                    self.render_inner(inner)?;
                } else {
                    write_escaped(self.out, inner)?;
                }
                self.out.write_all(close_tag.as_bytes())?;
                self.pos = close + len;
                return Ok(true);
            }
        }

        write_escaped(self.out, &self.text[start..after])?;
        self.pos = after;
        Ok(true)
    }

    /// First unescaped run of exactly `len` markers at or after `from`.
    fn find_closing_run(&self, from: usize, marker: u8, len: usize) -> Option<usize> {
        let mut pos = from;
        while let Some(offset) = memchr(marker, &self.text[pos..]) {
            let at = pos + offset;
            if self.text[at - 1] == b'\\' {
                pos = at + 1;
                continue;
            }
            let run = run_length(&self.text[at..], marker);
            if run == len {
                return Some(at);
            }
            pos = at + run;
        }
        None
    }

    fn try_link(&mut self) -> io::Result<bool> {
        let start = self.pos;
        let Some(close) = find_matching_close(&self.text[start..], b'[', b']') else {
            return Ok(false);
        };
        let text = self.text;
        let title_end = start + close;
        let title = &text[start + 1..title_end];

        if let Some(name) = title.strip_prefix(b"^") {
            if name.is_empty() {
                return Ok(false);
            }
            self.out.write_all(b"<sup><a href=\"#")?;
            self.out.write_all(name)?;
            self.out.write_all(b"\">*</a></sup>")?;
            self.pos = title_end + 1;
            return Ok(true);
        }

        let Some(href_end) = self.paren_target(title_end + 1) else {
            return Ok(false);
        };
        let href = &self.text[title_end + 2..href_end];

        self.out.write_all(b"<a href=\"")?;
        self.out.write_all(href)?;
        self.out.write_all(b"\">")?;
        self.render_inner(title)?;
        self.out.write_all(b"</a>")?;
        self.pos = href_end + 1;
        Ok(true)
    }

    fn try_image(&mut self) -> io::Result<bool> {
        let bracket = self.pos + 1;
        if self.text.get(bracket) != Some(&b'[') {
            return Ok(false);
        }
        let Some(close) = find_matching_close(&self.text[bracket..], b'[', b']') else {
            return Ok(false);
        };
        let alt_end = bracket + close;
        let Some(src_end) = self.paren_target(alt_end + 1) else {
            return Ok(false);
        };

        self.out.write_all(b"<img src=\"")?;
        self.out.write_all(&self.text[alt_end + 2..src_end])?;
        self.out.write_all(b"\" alt=\"")?;
        self.out.write_all(&self.text[bracket + 1..alt_end])?;
        self.out.write_all(b"\">")?;
        self.pos = src_end + 1;
        Ok(true)
    }

    /// Closing paren of a `(...)` target starting exactly at `paren`.
    fn paren_target(&self, paren: usize) -> Option<usize> {
        if self.text.get(paren) != Some(&b'(') {
            return None;
        }
        find_matching_close(&self.text[paren..], b'(', b')').map(|end| paren + end)
    }

    fn try_tag(&mut self) -> io::Result<bool> {
        let start = self.pos;
        match self.text.get(start + 1) {
            None => return Ok(false),
            Some(b) if b.is_ascii_whitespace() => return Ok(false),
            Some(_) => {}
        }
        let end = match find_tag_close(&self.text[start..]) {
            Some(end) if end > 1 => start + end,
            _ => return Ok(false),
        };
        let content = &self.text[start + 1..end];

        let colon = memchr(b':', content).is_some();
        let at_sign = memchr(b'@', content).is_some();
        let bare = content
            .iter()
            .all(|b| !b.is_ascii_whitespace() && !b.is_ascii_control());

        if bare && (colon || at_sign) {
            self.out.write_all(b"<a href=\"")?;
            if !colon {
                self.out.write_all(b"mailto:")?;
            }
            self.out.write_all(content)?;
            self.out.write_all(b"\">")?;
            write_escaped(self.out, content)?;
            self.out.write_all(b"</a>")?;
        } else {
            self.out.write_all(&self.text[start..=end])?;
        }
        self.pos = end + 1;
        Ok(true)
    }
}
