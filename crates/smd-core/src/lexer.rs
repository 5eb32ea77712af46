//! Line source with one line of lookahead.
//!
//! The converter never sees the whole document: lines are pulled from a
//! [`BufRead`] one at a time, with at most one extra line buffered for
//! `peek`. Every line is length-checked while it is read, so memory use is
//! bounded by [`Options::max_line_len`](crate::Options).
//!
//! # Line model
//!
//! - A `\r\n` terminator is normalised to `\n`
//! - A final line without a terminator gains one
//! - Container continuation prefixes are stripped by [`LineSource::read`]
//!   and [`LineSource::peek`], so block code only ever sees the content of
//!   the innermost container

use std::io::{BufRead, Read};

use tracing::error;

use crate::container::ContainerStack;
use crate::error::{Error, Result};
use crate::scan::is_blank;

/// A single physical line, always terminated by `\n`.
///
/// Stripping a prefix only moves the start offset; the bytes stay in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    buf: Vec<u8>,
    start: usize,
}

impl Line {
    /// Build a line from raw bytes, appending the terminator if missing.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let mut buf = bytes.into();
        if buf.last() != Some(&b'\n') {
            buf.push(b'\n');
        }
        Self { buf, start: 0 }
    }

    /// An empty line. Containers hand this out when a fence or caption
    /// line has been consumed and the next block must see a boundary.
    pub fn blank() -> Self {
        Self {
            buf: vec![b'\n'],
            start: 0,
        }
    }

    /// The unstripped remainder of the line, terminator included.
    #[inline(always)]
    pub fn text(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    /// Check if this line contains only whitespace.
    #[inline(always)]
    pub fn is_blank(&self) -> bool {
        is_blank(self.text())
    }

    /// Drop `n` bytes from the front of the line.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.start = (self.start + n).min(self.buf.len());
    }
}

/// Pull-based line reader for the block parser.
///
/// Holds at most one peeked line. Repeated peeks return the same line
/// until it is consumed by a read.
pub struct LineSource<R> {
    reader: R,
    /// Maximum data bytes per line, terminator excluded.
    max_len: usize,
    /// Number of physical lines fetched so far.
    line_no: usize,
    /// Peeked line (for lookahead).
    peeked: Option<Line>,
    eof: bool,
}

impl<R: BufRead> LineSource<R> {
    /// Create a new line source over `reader`.
    pub fn new(reader: R, max_len: usize) -> Self {
        Self {
            reader,
            max_len,
            line_no: 0,
            peeked: None,
            eof: false,
        }
    }

    /// Number of physical lines fetched from the reader, including a
    /// peeked one.
    #[inline(always)]
    pub fn line_number(&self) -> usize {
        self.line_no
    }

    /// Consume and return the next physical line, unstripped.
    pub fn read_raw(&mut self) -> Result<Option<Line>> {
        if let Some(line) = self.peeked.take() {
            return Ok(Some(line));
        }
        self.fetch()
    }

    /// Peek at the next physical line without consuming it.
    pub fn peek_raw(&mut self) -> Result<Option<&Line>> {
        if self.peeked.is_none() {
            self.peeked = self.fetch()?;
        }
        Ok(self.peeked.as_ref())
    }

    /// Consume the next line with the active container prefixes stripped.
    pub fn read(&mut self, containers: &ContainerStack) -> Result<Option<Line>> {
        let Some(mut line) = self.read_raw()? else {
            return Ok(None);
        };
        let strip = containers.prefix_len(line.text());
        line.advance(strip);
        Ok(Some(line))
    }

    /// Peek at the next line with the active container prefixes stripped.
    pub fn peek(&mut self, containers: &ContainerStack) -> Result<Option<&[u8]>> {
        let Some(line) = self.peek_raw()? else {
            return Ok(None);
        };
        let text = line.text();
        Ok(Some(&text[containers.prefix_len(text)..]))
    }

    /// First byte of the next stripped line.
    pub fn peek_byte(&mut self, containers: &ContainerStack) -> Result<Option<u8>> {
        Ok(self.peek(containers)?.and_then(|text| text.first().copied()))
    }

    /// Check if all input has been consumed.
    pub fn at_end(&mut self) -> Result<bool> {
        Ok(self.peek_raw()?.is_none())
    }

    /// Read the next line from the reader.
    ///
    /// At most `max_len + 2` bytes are buffered (data plus `\r\n`), so an
    /// overlong line is detected without reading it in full.
    fn fetch(&mut self) -> Result<Option<Line>> {
        if self.eof {
            return Ok(None);
        }

        let limit = self.max_len.saturating_add(2);
        let mut buf = Vec::new();
        let read = self
            .reader
            .by_ref()
            .take(limit as u64)
            .read_until(b'\n', &mut buf)?;

        if read == 0 {
            self.eof = true;
            return Ok(None);
        }
        self.line_no += 1;

        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        if (!terminated && read >= limit) || buf.len() > self.max_len {
            self.eof = true;
            error!(line = self.line_no, limit = self.max_len, "line too long");
            return Err(Error::LineTooLong {
                line: self.line_no,
                len: read,
                limit: self.max_len,
            });
        }

        buf.push(b'\n');
        Ok(Some(Line { buf, start: 0 }))
    }
}
