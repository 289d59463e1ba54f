//! Chatlog Storage Layer
//!
//! This crate implements the storage layer for chatlog: the binary file format
//! that a month of chat lines is kept in, and a small filesystem store that
//! keeps one such file per log.
//!
//! ## What is the Storage Layer?
//!
//! The storage layer sits between decoded logs in memory and files on disk.
//! It handles:
//!
//! 1. **Log Writing**: Converting a `Log` into one self-describing binary file
//! 2. **Log Reading**: Validating a file and rebuilding the `Log` from it
//! 3. **Name Deduplication**: Storing every author once, referenced by index
//! 4. **Variable Width**: 16, 32 or 64-bit offsets, chosen per file
//! 5. **Search**: Counting text occurrences over decoded logs
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────┐
//! │  Log source     │  (downloader, parser, ...)
//! └────────┬────────┘
//!          │ Log
//!          ▼
//! ┌─────────────────┐
//! │ LogStore::save  │
//! │  LogWriter      │ ◄── dedup names, lay out sections, encode
//! └────────┬────────┘
//!          │ file bytes
//!          ▼
//! ┌─────────────────┐
//! │  <root>/<chan>/ │
//! │   2018-09.log   │
//! └────────┬────────┘
//!          │ file bytes
//!          ▼
//! ┌─────────────────┐
//! │ LogStore::load  │
//! │  LogReader      │ ◄── validate sections, one buffer, views
//! └────────┬────────┘
//!          │ Log
//!          ▼
//! ┌─────────────────┐
//! │ count_in_log    │
//! └─────────────────┘
//! ```
//!
//! ## Main Components
//!
//! ### LogWriter
//! Encodes a complete log at a chosen format mode and byte order. Fails with
//! a capacity error, before writing anything, if a value does not fit.
//!
//! ### LogReader
//! Decodes a log of any format mode and either byte order. Every offset and
//! size is checked against the stream before it is used.
//!
//! ### LogStore
//! Maps identifiers to paths, saves atomically and treats unreadable files as
//! missing.
//!
//! ## Usage Example
//!
//! ### Writing and Reading a Log
//! ```ignore
//! use chatlog_core::{LogBuilder, LogIdentifier, TimePeriod};
//! use chatlog_storage::{LogStore, StoreConfig};
//!
//! let id = LogIdentifier::channel("dota2", TimePeriod::month(2018, 9)?);
//! let mut builder = LogBuilder::new(id.clone());
//! builder.push(1_536_000_000_000, "bob", "hello");
//! builder.push(1_536_000_060_000, "alice", "hi bob");
//! let log = builder.build()?;
//!
//! let store = LogStore::new(StoreConfig::new("/var/lib/chatlog"));
//! store.save(&log)?;
//!
//! let loaded = store.load(&id)?.expect("just saved");
//! assert_eq!(loaded, log);
//! ```
//!
//! ### Counting
//! ```ignore
//! use chatlog_storage::{count_in_log, SearchScope};
//!
//! let hits = count_in_log(&loaded, "bob", SearchScope::Line); // 2
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod search;
pub mod store;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use format::{
    deserialize_default_log_format, serialize_default_log_format, Endianness, FormatMode,
    LogReader, LogWriter,
};
pub use search::{count_in_log, count_in_logs, count_occurrences, SearchScope};
pub use store::LogStore;
