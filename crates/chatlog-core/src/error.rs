//! Error Types for Chatlog
//!
//! This module defines all error types that can occur while building, encoding
//! or decoding a log.
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! - `Io`: a read, write or seek on the underlying stream failed. The codec
//!   never retries; the error is surfaced to the caller unchanged.
//!
//! ### Data Integrity Errors
//! - `Format`: the bytes do not describe a valid log file (unknown format mode,
//!   section outside the stream, truncated records, unresolved name index,
//!   invalid UTF-8). Decoding always aborts; no partial log is produced.
//!
//! ### Encoding Errors
//! - `Capacity`: an offset, size or count does not fit in the field width of
//!   the selected format mode. Re-encode with a wider mode.
//!
//! ### Caller Errors
//! - `InvariantViolation`: the caller supplied unsorted or duplicate names, a
//!   line whose author is missing from the name table, or a span outside its
//!   buffer. This is a programming error, not a transient failure.
//!
//! ## Usage
//! All fallible functions return `Result<T>`, aliased to `Result<T, Error>`,
//! so errors propagate with `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log format: {0}")]
    Format(String),

    #[error("Value {value} of field {field} does not fit in {bits}-bit format mode")]
    Capacity {
        field: &'static str,
        value: u64,
        bits: u32,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl Error {
    /// Shorthand for a `Format` error
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Shorthand for an `InvariantViolation` error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }

    /// True if the error means the input bytes are not a readable log
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
