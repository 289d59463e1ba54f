//! Storage Error Types
//!
//! This module defines the errors that can occur while storing and loading
//! logs on disk.
//!
//! ## Error Categories
//!
//! ### Codec Errors
//! - `Codec`: encoding or decoding a log failed (capacity, malformed input,
//!   broken log invariants); wraps `chatlog_core::Error`
//!
//! ### Filesystem Errors
//! - `Io`: a file or directory operation failed
//!
//! ### Store Errors
//! - `Config`: the store configuration could not be parsed or written
//! - `InvalidIdentifier`: an identifier cannot be mapped to a safe file path
//!
//! ## Usage
//!
//! All store operations return `Result<T>` which is aliased to
//! `Result<T, Error>`. This allows clean error propagation with `?`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Codec error: {0}")]
    Codec(#[from] chatlog_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid log identifier: {0}")]
    InvalidIdentifier(String),
}
