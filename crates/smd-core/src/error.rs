use std::io;

use thiserror::Error;

/// Error kinds for categorizing conversion errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A physical line exceeded the configured maximum length
    LineTooLong,
    /// The line source or the output sink failed
    Io,
}

/// An error that stopped a conversion.
///
/// Malformed markup never produces an error: unmatched delimiters, brackets
/// and fences degrade to literal text. The only condition raised by the
/// converter itself is [`Error::LineTooLong`].
#[derive(Debug, Error)]
pub enum Error {
    /// A physical line was longer than [`Options::max_line_len`](crate::Options).
    #[error("line {line} too long: {len} bytes exceeds the limit of {limit}")]
    LineTooLong {
        /// One-based number of the offending line.
        line: usize,
        /// Bytes read before giving up (at least `limit + 1`).
        len: usize,
        /// The configured limit.
        limit: usize,
    },

    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Get the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::LineTooLong { .. } => ErrorKind::LineTooLong,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether this is the converter's own fatal condition, as opposed to
    /// a failure of the surrounding I/O.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::LineTooLong { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
