//! # smd Core
//!
//! A streaming converter from a lightweight markup format to HTML.
//!
//! Input is consumed as a single forward stream of lines with one line of
//! lookahead; HTML is written as soon as each line is understood. Nothing
//! is buffered beyond the current and the peeked line.
//!
//! ## Quick Start
//!
//! ```rust
//! let html = smd_core::to_html("# Hello\n\nThis is a **paragraph**.\n").unwrap();
//! assert_eq!(html, "<h1>Hello</h1>\n<p>This is a <strong>paragraph</strong>.\n</p>\n");
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use smd_core::{Converter, Options};
//!
//! let input = "> * quoted item\n";
//! let (html, stats) = Converter::with_options(input.as_bytes(), Vec::new(), &Options::default())
//!     .run()
//!     .unwrap();
//! assert_eq!(stats.max_depth, 2);
//! assert!(html.starts_with(b"<blockquote>\n<ul>\n<li>\n"));
//! ```
//!
//! ## Errors
//!
//! Malformed markup never fails: unmatched delimiters, brackets and fences
//! are written out as literal text. The one fatal condition is a physical
//! line longer than [`Options::max_line_len`], reported as
//! [`Error::LineTooLong`]; the conversion stops there.

mod block;
pub mod container;
pub mod converter;
pub mod error;
pub mod escape;
pub mod inline;
pub mod lexer;
pub mod scan;

pub use container::{Container, ContainerStack};
pub use converter::{
    render, to_html, to_html_with, Converter, Options, RenderStats, DEFAULT_MAX_LINE_LEN,
};
pub use error::{Error, ErrorKind, Result};
pub use lexer::{Line, LineSource};
