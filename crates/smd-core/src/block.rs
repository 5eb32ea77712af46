//! Block classification and rendering.
//!
//! Each block-initial line is classified once, in a fixed order, and the
//! block is then rendered while its continuation lines are pulled from the
//! line source. No block is buffered: every line is written as soon as it
//! is read.

use std::io::{BufRead, Write};

use memchr::{memchr, memchr_iter};
use tracing::debug;

use crate::container::BlockStart;
use crate::converter::Converter;
use crate::error::Result;
use crate::escape::write_escaped;
use crate::inline;
use crate::lexer::Line;
use crate::scan::{
    heading_level, is_blank, ordered_marker, run_length, skip_blanks, trim, unindent,
};

/// Line prefixes that end a paragraph.
const INTERRUPTS: &[&[u8]] = &[
    b"$$", b"```", b"---", b"* ", b"- ", b"+ ", b"> ", b":::", b"+++", b"| ", b"= ",
];

impl<R: BufRead, W: Write> Converter<R, W> {
    /// Classify one block-initial line and render the whole block.
    pub(crate) fn process_block(&mut self, start: BlockStart) -> Result<()> {
        let BlockStart { line, tight } = start;
        let text = line.text();

        if text.starts_with(b"---") {
            debug!(kind = "thematic_break");
            self.out.write_all(b"<hr>\n")?;
            return Ok(());
        }
        if unindent(text).is_some() {
            return self.parse_indented_code(line);
        }
        if text.starts_with(b"```") {
            return self.parse_fenced_code(line);
        }
        if text.starts_with(b"$$") {
            return self.parse_math_block(line);
        }
        if text.starts_with(b"| ") {
            return self.parse_table(line);
        }
        if text.starts_with(b"= ") {
            return self.parse_description_list(line);
        }
        if let Some(level) = heading_level(text) {
            return self.parse_heading(&line, level);
        }
        if footnote_label(text).is_some() {
            return self.parse_footnote(line);
        }
        if let Some(level) = self.setext_level()? {
            return self.parse_setext_heading(line, level);
        }
        self.parse_paragraph(line, tight)
    }

    fn parse_indented_code(&mut self, line: Line) -> Result<()> {
        debug!(kind = "indented_code");
        self.out.write_all(b"<pre><code>")?;
        let mut current = line;
        loop {
            let text = current.text();
            write_escaped(&mut self.out, unindent(text).unwrap_or(text))?;

            let more = matches!(self.peek_line()?, Some(next) if unindent(next).is_some());
            if !more {
                break;
            }
            match self.read_line()? {
                Some(next) => current = next,
                None => break,
            }
        }
        self.out.write_all(b"</code></pre>\n")?;
        Ok(())
    }

    fn parse_fenced_code(&mut self, line: Line) -> Result<()> {
        let text = line.text();
        let fence = run_length(text, b'`');
        let lang = trim(&text[fence..])
            .split(|b| b.is_ascii_whitespace())
            .next()
            .unwrap_or_default();
        debug!(kind = "fenced_code", fence);

        if lang.is_empty() {
            self.out.write_all(b"<pre><code>")?;
        } else {
            self.out.write_all(b"<pre><code class=\"language-")?;
            self.out.write_all(lang)?;
            self.out.write_all(b"\">")?;
        }

        while let Some(next) = self.read_line()? {
            if run_length(next.text(), b'`') >= fence {
                break;
            }
            write_escaped(&mut self.out, next.text())?;
        }

        self.out.write_all(b"</code></pre>\n")?;
        Ok(())
    }

    fn parse_math_block(&mut self, line: Line) -> Result<()> {
        debug!(kind = "math_block");
        self.out.write_all(b"\\[")?;

        let mut current = line;
        let mut offset = 2;
        loop {
            let text = &current.text()[offset..];
            let content = text.trim_ascii_end();
            if let Some(inner) = content.strip_suffix(b"$$") {
                write_escaped(&mut self.out, inner)?;
                break;
            }
            write_escaped(&mut self.out, text)?;

            match self.read_line()? {
                Some(next) => {
                    current = next;
                    offset = 0;
                }
                None => break,
            }
        }

        self.out.write_all(b"\\]\n")?;
        Ok(())
    }

    fn parse_table(&mut self, line: Line) -> Result<()> {
        debug!(kind = "table");
        self.out.write_all(b"<table>\n<thead>\n")?;
        self.write_table_row(line.text(), "th")?;
        self.out.write_all(b"</thead>\n")?;

        if self.peek_line()?.is_some_and(is_table_divider) {
            self.read_line()?;
        }

        let mut in_body = false;
        while self.peek_line()?.is_some_and(|next| next.first() == Some(&b'|')) {
            let Some(row) = self.read_line()? else {
                break;
            };
            if !in_body {
                self.out.write_all(b"<tbody>\n")?;
                in_body = true;
            }
            self.write_table_row(row.text(), "td")?;
        }

        if in_body {
            self.out.write_all(b"</tbody>\n")?;
        }
        self.out.write_all(b"</table>\n")?;
        Ok(())
    }

    /// One `<tr>`; cells sit between unescaped pipes, text after the last
    /// pipe is ignored.
    fn write_table_row(&mut self, text: &[u8], cell: &str) -> Result<()> {
        self.out.write_all(b"<tr>\n")?;
        let mut cell_start = 1;
        for pipe in memchr_iter(b'|', text).filter(|&i| i > 0 && text[i - 1] != b'\\') {
            write!(self.out, "<{cell}>")?;
            inline::render(&mut self.out, trim(&text[cell_start..pipe]))?;
            writeln!(self.out, "</{cell}>")?;
            cell_start = pipe + 1;
        }
        self.out.write_all(b"</tr>\n")?;
        Ok(())
    }

    fn parse_description_list(&mut self, line: Line) -> Result<()> {
        debug!(kind = "description_list");
        self.out.write_all(b"<dl>\n")?;
        self.write_description_item(line.text())?;

        while self.peek_line()?.is_some_and(|next| next.starts_with(b"= ")) {
            let Some(item) = self.read_line()? else {
                break;
            };
            self.write_description_item(item.text())?;
        }

        self.out.write_all(b"</dl>\n")?;
        Ok(())
    }

    /// `= term: definition`. The first colon splits the two; an item
    /// without one is a bare term.
    fn write_description_item(&mut self, text: &[u8]) -> Result<()> {
        let item = skip_blanks(&text[1..]);
        let (term, definition) = match memchr(b':', item) {
            Some(colon) => (trim(&item[..colon]), Some(trim(&item[colon + 1..]))),
            None => (trim(item), None),
        };

        self.out.write_all(b"<dt>\n")?;
        inline::render(&mut self.out, term)?;
        self.out.write_all(b"\n</dt>\n")?;
        if let Some(definition) = definition {
            self.out.write_all(b"<dd>\n")?;
            inline::render(&mut self.out, definition)?;
            self.out.write_all(b"\n</dd>\n")?;
        }
        Ok(())
    }

    fn parse_heading(&mut self, line: &Line, level: usize) -> Result<()> {
        debug!(kind = "heading", level);
        let title = heading_title(&line.text()[level..]);
        self.write_heading(level, title)
    }

    fn write_heading(&mut self, level: usize, title: &[u8]) -> Result<()> {
        write!(self.out, "<h{level}>")?;
        inline::render(&mut self.out, title)?;
        writeln!(self.out, "</h{level}>")?;
        Ok(())
    }

    fn parse_footnote(&mut self, line: Line) -> Result<()> {
        let text = line.text();
        let Some(name) = footnote_label(text) else {
            return self.parse_paragraph(line, false);
        };
        debug!(kind = "footnote");

        self.out.write_all(b"<p id=\"")?;
        self.out.write_all(name)?;
        self.out.write_all(b"\">")?;
        inline::render(&mut self.out, skip_blanks(&text[name.len() + 4..]))?;

        // Indented and blank lines continue the definition.
        while self
            .source
            .peek_byte(&self.containers)?
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            let Some(next) = self.read_line()? else {
                break;
            };
            inline::render(&mut self.out, skip_blanks(next.text()))?;
        }

        self.out.write_all(b"</p>\n")?;
        Ok(())
    }

    /// Level of the setext underline on the next line, if there is one.
    fn setext_level(&mut self) -> Result<Option<usize>> {
        let Some(next) = self.peek_line()? else {
            return Ok(None);
        };
        let level = match next.first() {
            Some(b'=') => 1,
            Some(b'-') => 2,
            _ => return Ok(None),
        };
        let underline = run_length(next, next[0]);
        Ok(is_blank(&next[underline..]).then_some(level))
    }

    fn parse_setext_heading(&mut self, line: Line, level: usize) -> Result<()> {
        debug!(kind = "setext_heading", level);
        self.write_heading(level, trim(line.text()))?;
        self.read_line()?;
        Ok(())
    }

    fn parse_paragraph(&mut self, line: Line, tight: bool) -> Result<()> {
        debug!(kind = "paragraph", tight);
        if !tight {
            self.out.write_all(b"<p>")?;
        }
        inline::render(&mut self.out, line.text())?;

        loop {
            let more = match self.peek_line()? {
                Some(next) => !is_paragraph_interrupt(next),
                None => false,
            };
            if !more {
                break;
            }
            let Some(next) = self.read_line()? else {
                break;
            };
            inline::render(&mut self.out, next.text())?;
        }

        if !tight {
            self.out.write_all(b"</p>\n")?;
        }
        Ok(())
    }
}

/// Name of a `[^name]:` footnote definition at the start of `text`.
fn footnote_label(text: &[u8]) -> Option<&[u8]> {
    let rest = text.strip_prefix(b"[^")?;
    let end = memchr(b']', rest)?;
    if end == 0 || rest.get(end + 1) != Some(&b':') {
        return None;
    }
    Some(&rest[..end])
}

/// Heading text with surrounding whitespace and a closing `#` run removed.
fn heading_title(text: &[u8]) -> &[u8] {
    let title = trim(text);
    let hashes = title.iter().rev().take_while(|&&b| b == b'#').count();
    let body = &title[..title.len() - hashes];
    if hashes > 0 && (body.is_empty() || body.ends_with(b" ") || body.ends_with(b"\t")) {
        trim(body)
    } else {
        title
    }
}

fn is_table_divider(text: &[u8]) -> bool {
    text.first() == Some(&b'|')
        && memchr(b'-', text).is_some()
        && text
            .iter()
            .all(|&b| matches!(b, b'|' | b'-' | b':') || b.is_ascii_whitespace())
}

fn is_paragraph_interrupt(text: &[u8]) -> bool {
    is_blank(text)
        || INTERRUPTS.iter().any(|prefix| text.starts_with(prefix))
        || heading_level(text).is_some()
        || ordered_marker(text).is_some()
}
