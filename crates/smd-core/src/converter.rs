//! Document driver.
//!
//! A [`Converter`] owns everything one conversion needs: the line source,
//! the container stack and the output sink. Nothing is shared between
//! converters, so independent documents can be converted concurrently,
//! each on its own instance.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::container::{BlockStart, ContainerStack};
use crate::error::Result;
use crate::lexer::{Line, LineSource};

/// Default maximum number of data bytes in one physical line.
pub const DEFAULT_MAX_LINE_LEN: usize = 4094;

/// Conversion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Lines longer than this (terminator excluded) abort the conversion.
    pub max_line_len: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// Counters collected during a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    /// Physical input lines read.
    pub lines: usize,
    /// Blocks classified and rendered, not counting blank lines.
    pub blocks: usize,
    /// Containers opened.
    pub containers: usize,
    /// Deepest container nesting.
    pub max_depth: usize,
}

/// Streaming converter from markup lines to an HTML fragment.
pub struct Converter<R, W> {
    pub(crate) source: LineSource<R>,
    pub(crate) containers: ContainerStack,
    pub(crate) out: W,
    blocks: usize,
}

impl<R: BufRead, W: Write> Converter<R, W> {
    /// Create a converter with default options.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_options(reader, writer, &Options::default())
    }

    /// Create a converter with the given options.
    pub fn with_options(reader: R, writer: W, options: &Options) -> Self {
        Self {
            source: LineSource::new(reader, options.max_line_len),
            containers: ContainerStack::new(),
            out: writer,
            blocks: 0,
        }
    }

    /// Convert the whole input, returning the flushed sink.
    ///
    /// On error the conversion stops where it is: open containers are not
    /// closed and nothing further is written.
    pub fn run(mut self) -> Result<(W, RenderStats)> {
        while let Some(start) = self.begin_block()? {
            if start.line.is_blank() {
                continue;
            }
            self.blocks += 1;
            self.process_block(start)?;
        }
        self.out.flush()?;
        debug!(lines = self.source.line_number(), blocks = self.blocks, "done");

        let stats = self.stats();
        Ok((self.out, stats))
    }

    /// Advance to the next block-initial line.
    ///
    /// Closes and opens containers for the next physical line and returns
    /// what is left of it, or `None` at end of input once every container
    /// has been closed.
    pub fn begin_block(&mut self) -> Result<Option<BlockStart>> {
        let raw = self.source.read_raw()?;
        let Some(start) = self.containers.close_blocks(raw, &mut self.out)? else {
            return Ok(None);
        };
        Ok(Some(self.containers.open_blocks(start, &mut self.out)?))
    }

    /// Counters so far.
    pub fn stats(&self) -> RenderStats {
        RenderStats {
            lines: self.source.line_number(),
            blocks: self.blocks,
            containers: self.containers.opened(),
            max_depth: self.containers.max_depth(),
        }
    }

    /// Consume the next line inside the current containers.
    pub(crate) fn read_line(&mut self) -> Result<Option<Line>> {
        self.source.read(&self.containers)
    }

    /// Look at the next line inside the current containers.
    pub(crate) fn peek_line(&mut self) -> Result<Option<&[u8]>> {
        self.source.peek(&self.containers)
    }
}

/// Convert everything `reader` yields into `writer`.
pub fn render<R: BufRead, W: Write>(reader: R, writer: W, options: &Options) -> Result<RenderStats> {
    let (_, stats) = Converter::with_options(reader, writer, options).run()?;
    Ok(stats)
}

/// Convert an in-memory document with default options.
pub fn to_html(input: &str) -> Result<String> {
    to_html_with(input, &Options::default())
}

/// Convert an in-memory document.
pub fn to_html_with(input: &str, options: &Options) -> Result<String> {
    let (out, _) = Converter::with_options(input.as_bytes(), Vec::new(), options).run()?;
    // Output only ever splits the input at ASCII bytes.
    Ok(String::from_utf8_lossy(&out).into_owned())
}
