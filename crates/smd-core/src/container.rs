//! Block container tracking.
//!
//! Quotes, list items, asides and details blocks wrap other blocks and can
//! nest. The [`ContainerStack`] keeps the open ones outer to inner. Each new
//! physical line is first checked against every open container's
//! continuation rule ([`ContainerStack::close_blocks`]); containers that are
//! no longer continued are closed. Openers at the front of what remains then
//! push new containers ([`ContainerStack::open_blocks`]). Wrapper tags are
//! written as a side effect of both steps.

use std::io::{self, Write};

use tracing::{trace, warn};

use crate::inline;
use crate::lexer::Line;
use crate::scan::{is_blank, ordered_marker, skip_blanks, trim};

/// Maximum number of simultaneously open containers. Openers past this
/// depth are left in the line as content.
pub const MAX_DEPTH: usize = 256;

/// A nestable block wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// `> `
    Blockquote,
    /// `* `, `- ` or `+ `; siblings must use the same marker.
    Bullet(u8),
    /// `1. `; `width` is the marker width, which is also the indentation
    /// continuation lines need.
    Ordered { width: usize },
    /// `:::` ... `:::`
    Aside,
    /// `+++ caption` ... `+++`
    Details,
}

/// How a line relates to one open container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Still inside; strip this many bytes and check the next level.
    Continue(usize),
    /// A sibling item starts here; strip this many bytes.
    Reopen(Container, usize),
    /// Not continued. `fence` is set when the line was the closing fence
    /// and has been consumed.
    Close { fence: bool },
}

impl Container {
    /// Match a container opener at the start of `text`.
    ///
    /// Returns the container and the number of bytes the opener occupies.
    pub fn opener(text: &[u8]) -> Option<(Container, usize)> {
        match *text.first()? {
            b'>' => Some((Container::Blockquote, quote_marker_len(text))),
            b':' if text.starts_with(b":::") => Some((Container::Aside, 3)),
            b'+' if text.starts_with(b"+++") => Some((Container::Details, 3)),
            marker @ (b'*' | b'-' | b'+') if text.get(1) == Some(&b' ') => {
                Some((Container::Bullet(marker), 2))
            }
            b'0'..=b'9' => {
                ordered_marker(text).map(|width| (Container::Ordered { width }, width))
            }
            _ => None,
        }
    }

    pub fn is_list_item(self) -> bool {
        matches!(self, Container::Bullet(_) | Container::Ordered { .. })
    }

    fn open_tag(self) -> &'static [u8] {
        match self {
            Container::Blockquote => b"<blockquote>\n",
            Container::Bullet(_) => b"<ul>\n<li>\n",
            Container::Ordered { .. } => b"<ol>\n<li>\n",
            Container::Aside => b"<aside>\n",
            Container::Details => b"<details>\n",
        }
    }

    fn close_tag(self) -> &'static [u8] {
        match self {
            Container::Blockquote => b"</blockquote>\n",
            Container::Bullet(_) => b"</li>\n</ul>\n",
            Container::Ordered { .. } => b"</li>\n</ol>\n",
            Container::Aside => b"</aside>\n",
            Container::Details => b"</details>\n",
        }
    }

    fn reopen_tag(self) -> &'static [u8] {
        b"</li>\n<li>\n"
    }

    fn continuation(self, text: &[u8]) -> Continuation {
        match self {
            Container::Blockquote => {
                if text.first() == Some(&b'>') {
                    Continuation::Continue(quote_marker_len(text))
                } else {
                    Continuation::Close { fence: false }
                }
            }
            Container::Bullet(marker) => {
                if text.first() == Some(&marker) && text.get(1) == Some(&b' ') {
                    Continuation::Reopen(self, 2)
                } else {
                    list_indent(text, 2)
                }
            }
            Container::Ordered { width } => match ordered_marker(text) {
                Some(next) => Continuation::Reopen(Container::Ordered { width: next }, next),
                None => list_indent(text, width),
            },
            Container::Aside => fence_continuation(text, b":::"),
            Container::Details => fence_continuation(text, b"+++"),
        }
    }

    /// Bytes of continuation prefix to strip from a line read mid-block.
    ///
    /// Lenient: a missing or partial prefix strips what is there, which
    /// lets paragraphs run on lazily.
    fn prefix_len(self, text: &[u8]) -> usize {
        match self {
            Container::Blockquote if text.first() == Some(&b'>') => quote_marker_len(text),
            Container::Bullet(_) => indent_len(text, 2),
            Container::Ordered { width } => indent_len(text, width),
            _ => 0,
        }
    }
}

fn quote_marker_len(text: &[u8]) -> usize {
    if text.get(1) == Some(&b' ') {
        2
    } else {
        1
    }
}

fn indent_len(text: &[u8], width: usize) -> usize {
    if text.first() == Some(&b'\t') {
        1
    } else {
        text.iter().take(width).take_while(|&&b| b == b' ').count()
    }
}

fn list_indent(text: &[u8], width: usize) -> Continuation {
    if is_blank(text) {
        Continuation::Continue(0)
    } else if text.first() == Some(&b'\t') || indent_len(text, width) == width {
        Continuation::Continue(indent_len(text, width))
    } else {
        Continuation::Close { fence: false }
    }
}

fn fence_continuation(text: &[u8], fence: &[u8]) -> Continuation {
    if trim(text) == fence {
        Continuation::Close { fence: true }
    } else {
        Continuation::Continue(0)
    }
}

/// A line ready for block classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStart {
    /// The line with all container markup removed.
    pub line: Line,
    /// The line followed a list-item marker directly, so a paragraph
    /// here is rendered without a `<p>` wrapper.
    pub tight: bool,
}

impl BlockStart {
    fn new(line: Line) -> Self {
        Self { line, tight: false }
    }
}

/// Open containers, outermost first.
#[derive(Debug, Default)]
pub struct ContainerStack {
    open: Vec<Container>,
    /// Total containers opened over the whole document.
    opened: usize,
    max_depth: usize,
}

impl ContainerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open containers.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Total number of containers opened so far.
    pub fn opened(&self) -> usize {
        self.opened
    }

    /// Deepest nesting reached so far.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Total prefix length the open containers strip from `text`.
    pub fn prefix_len(&self, text: &[u8]) -> usize {
        self.open
            .iter()
            .fold(0, |pos, container| pos + container.prefix_len(&text[pos..]))
    }

    /// Close every container the raw line no longer continues.
    ///
    /// `None` means end of input: everything is closed and `None` returned.
    pub fn close_blocks<W: Write + ?Sized>(
        &mut self,
        line: Option<Line>,
        out: &mut W,
    ) -> io::Result<Option<BlockStart>> {
        let Some(mut line) = line else {
            self.close_to(0, out)?;
            return Ok(None);
        };

        for level in 0..self.open.len() {
            let container = self.open[level];
            let mut continuation = container.continuation(line.text());
            // A closing fence belongs to the innermost open container of its kind.
            if continuation == (Continuation::Close { fence: true })
                && self.open[level + 1..].contains(&container)
            {
                continuation = Continuation::Continue(0);
            }

            match continuation {
                Continuation::Continue(n) => line.advance(n),
                Continuation::Reopen(next, n) => {
                    self.close_to(level + 1, out)?;
                    trace!(?next, level, "reopen");
                    out.write_all(next.reopen_tag())?;
                    self.open[level] = next;
                    line.advance(n);
                    return Ok(Some(BlockStart { line, tight: true }));
                }
                Continuation::Close { fence } => {
                    self.close_to(level, out)?;
                    if fence {
                        line = Line::blank();
                    }
                    return Ok(Some(BlockStart::new(line)));
                }
            }
        }

        Ok(Some(BlockStart::new(line)))
    }

    /// Push a container for every opener at the front of the line.
    pub fn open_blocks<W: Write + ?Sized>(
        &mut self,
        mut start: BlockStart,
        out: &mut W,
    ) -> io::Result<BlockStart> {
        while let Some((container, n)) = Container::opener(start.line.text()) {
            if self.open.len() >= MAX_DEPTH {
                warn!(depth = MAX_DEPTH, "container depth limit reached");
                break;
            }

            start.line.advance(n);
            out.write_all(container.open_tag())?;
            self.push(container);
            start.tight = container.is_list_item();

            match container {
                Container::Details => {
                    out.write_all(b"<summary>")?;
                    inline::render(out, trim(start.line.text()))?;
                    out.write_all(b"</summary>\n")?;
                    return Ok(BlockStart::new(Line::blank()));
                }
                Container::Aside => {
                    let rest = start.line.text();
                    let skip = rest.len() - skip_blanks(rest).len();
                    start.line.advance(skip);
                }
                _ => {}
            }
        }
        Ok(start)
    }

    /// Close all containers deeper than `level`, innermost first.
    pub fn close_to<W: Write + ?Sized>(&mut self, level: usize, out: &mut W) -> io::Result<()> {
        while self.open.len() > level {
            if let Some(container) = self.open.pop() {
                trace!(?container, depth = self.open.len(), "close");
                out.write_all(container.close_tag())?;
            }
        }
        Ok(())
    }

    fn push(&mut self, container: Container) {
        trace!(?container, depth = self.open.len(), "open");
        self.open.push(container);
        self.opened += 1;
        self.max_depth = self.max_depth.max(self.open.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn begin(stack: &mut ContainerStack, raw: &str) -> (BlockStart, String) {
        let mut out = Vec::new();
        let start = stack
            .close_blocks(Some(Line::new(raw)), &mut out)
            .unwrap()
            .unwrap();
        let start = stack.open_blocks(start, &mut out).unwrap();
        (start, String::from_utf8(out).unwrap())
    }

    fn finish(stack: &mut ContainerStack) -> String {
        let mut out = Vec::new();
        assert!(stack.close_blocks(None, &mut out).unwrap().is_none());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn openers() {
        assert_eq!(Container::opener(b"> x"), Some((Container::Blockquote, 2)));
        assert_eq!(Container::opener(b">x"), Some((Container::Blockquote, 1)));
        assert_eq!(Container::opener(b"- x"), Some((Container::Bullet(b'-'), 2)));
        assert_eq!(Container::opener(b"+++ s"), Some((Container::Details, 3)));
        assert_eq!(Container::opener(b"+ x"), Some((Container::Bullet(b'+'), 2)));
        assert_eq!(
            Container::opener(b"12. x"),
            Some((Container::Ordered { width: 4 }, 4))
        );
        assert_eq!(Container::opener(b"::: x"), Some((Container::Aside, 3)));
        assert_eq!(Container::opener(b"---"), None);
        assert_eq!(Container::opener(b"*em*"), None);
    }

    #[test]
    fn nested_openers_on_one_line() {
        let mut stack = ContainerStack::new();
        let (start, html) = begin(&mut stack, "> * item");
        assert_eq!(html, "<blockquote>\n<ul>\n<li>\n");
        assert_eq!(start.line.text(), b"item\n");
        assert!(start.tight);
        assert_eq!(stack.depth(), 2);
        assert_eq!(finish(&mut stack), "</li>\n</ul>\n</blockquote>\n");
    }

    #[test]
    fn sibling_item_reopens() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, "* a");
        let (start, html) = begin(&mut stack, "* b");
        assert_eq!(html, "</li>\n<li>\n");
        assert_eq!(start.line.text(), b"b\n");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn nested_sibling_keeps_parent_open() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, "* a");
        begin(&mut stack, "  * b");
        assert_eq!(stack.depth(), 2);
        let (_, html) = begin(&mut stack, "* c");
        assert_eq!(html, "</li>\n</ul>\n</li>\n<li>\n");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn different_marker_starts_new_list() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, "* a");
        let (_, html) = begin(&mut stack, "- b");
        assert_eq!(html, "</li>\n</ul>\n<ul>\n<li>\n");
    }

    #[test]
    fn ordered_reopen_tracks_marker_width() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, "9. a");
        let (start, html) = begin(&mut stack, "10. b");
        assert_eq!(html, "</li>\n<li>\n");
        assert_eq!(start.line.text(), b"b\n");
        let (start, html) = begin(&mut stack, "    more");
        assert_eq!(html, "");
        assert_eq!(start.line.text(), b"more\n");
    }

    #[test]
    fn blank_line_keeps_lists_but_closes_quotes() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, "* a");
        let (start, html) = begin(&mut stack, "");
        assert!(start.line.is_blank());
        assert_eq!(html, "");
        assert_eq!(stack.depth(), 1);

        let mut stack = ContainerStack::new();
        begin(&mut stack, "> a");
        let (_, html) = begin(&mut stack, "");
        assert_eq!(html, "</blockquote>\n");
    }

    #[test]
    fn unindented_line_closes_list() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, "* a");
        let (start, html) = begin(&mut stack, "after");
        assert_eq!(html, "</li>\n</ul>\n");
        assert_eq!(start.line.text(), b"after\n");
        assert!(!start.tight);
    }

    #[test]
    fn aside_fence_closes_and_yields_blank() {
        let mut stack = ContainerStack::new();
        let (start, html) = begin(&mut stack, ":::");
        assert_eq!(html, "<aside>\n");
        assert!(start.line.is_blank());
        begin(&mut stack, "> quoted");
        let (start, html) = begin(&mut stack, ":::");
        assert_eq!(html, "</blockquote>\n</aside>\n");
        assert!(start.line.is_blank());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn details_renders_caption() {
        let mut stack = ContainerStack::new();
        let (start, html) = begin(&mut stack, "+++ More *info*");
        assert_eq!(html, "<details>\n<summary>More <em>info</em></summary>\n");
        assert!(start.line.is_blank());
        let (_, html) = begin(&mut stack, "+++");
        assert_eq!(html, "</details>\n");
    }

    #[test]
    fn closing_fence_matches_innermost() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, "+++ S");
        begin(&mut stack, "+++ T");
        assert_eq!(stack.depth(), 2);

        let (start, html) = begin(&mut stack, "+++");
        assert_eq!(html, "</details>\n");
        assert!(start.line.is_blank());
        assert_eq!(stack.depth(), 1);

        let (_, html) = begin(&mut stack, "+++");
        assert_eq!(html, "</details>\n");
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn closing_fence_skips_other_kinds() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, ":::");
        begin(&mut stack, "+++ S");
        let (_, html) = begin(&mut stack, ":::");
        assert_eq!(html, "</details>\n</aside>\n");
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn prefix_len_strips_active_prefixes() {
        let mut stack = ContainerStack::new();
        begin(&mut stack, "> * a");
        assert_eq!(stack.prefix_len(b">   b\n"), 4);
        assert_eq!(stack.prefix_len(b"lazy\n"), 0);
    }

    #[test]
    fn depth_is_bounded() {
        let mut stack = ContainerStack::new();
        let raw = ">".repeat(MAX_DEPTH + 3);
        let (start, _) = begin(&mut stack, &raw);
        assert_eq!(stack.depth(), MAX_DEPTH);
        assert_eq!(start.line.text(), b">>>\n");
        assert_eq!(stack.max_depth(), MAX_DEPTH);
    }
}
