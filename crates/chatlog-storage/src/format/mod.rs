//! Log File Format
//!
//! This module implements the binary container a `Log` is persisted in.
//!
//! ## File Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header                                                      │
//! │ - format_mode (1 byte): 1 = 16-bit, 2 = 32-bit, 3 = 64-bit  │
//! │ - endianness (1 byte): 1 = big, 2 = little                  │
//! │ - reserved (6 bytes, zero)                                  │
//! │ - channel_name offset, size          (W each)               │
//! │ - userlog_name offset, size          (W each, 0/0 if none)  │
//! │ - username_data offset, size         (W each)               │
//! │ - message_data offset, size          (W each)               │
//! │ - username_set offset, entry count   (W each)               │
//! │ - timepoint_list offset              (W)                    │
//! │ - username_list offset               (W)                    │
//! │ - message_list offset                (W)                    │
//! │ - number_of_lines                    (W)                    │
//! │ - time_period begin, end             (8 bytes each)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │ channel_name: UTF-8 bytes                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ userlog_name: UTF-8 bytes (only for user logs)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │ username_data: every distinct name, concatenated            │
//! ├─────────────────────────────────────────────────────────────┤
//! │ message_data: every message, concatenated in line order     │
//! ├─────────────────────────────────────────────────────────────┤
//! │ username_set: (offset, size) per distinct name   (2W each)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │ timepoint_list: time per line                    (8 each)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ username_list: username_set index per line       (W each)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ message_list: (offset, size) per line            (2W each)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `W` is the field width selected by `format_mode`. Every multi-byte integer,
//! time values included, is stored in the byte order named by `endianness`.
//! The header is 52, 80 or 136 bytes long for the three widths.
//!
//! Offsets in the header are absolute file positions. Offsets inside
//! `username_set` and `message_list` records are relative to the start of
//! `username_data` and `message_data` respectively.
//!
//! ## Why Explicit Sizes?
//!
//! Every section carries its own offset and size, so a reader never infers a
//! size from the distance between two offsets. Optional sections need no
//! special casing, and every section can be bounds-checked on its own before
//! a single byte of it is read.
//!
//! ## Why a Name Table?
//!
//! Chat logs repeat a small set of authors thousands of times. Names are
//! stored once in `username_data`; each line stores only a table index.
//!
//! ## Usage
//!
//! ```ignore
//! let mut file = File::create("dota2-2018-09.log")?;
//! serialize_default_log_format(&mut file, &log)?;
//!
//! let mut file = File::open("dota2-2018-09.log")?;
//! let decoded = deserialize_default_log_format(&mut file);
//! assert_eq!(decoded.as_ref(), Some(&log));
//! ```

mod dedup;
mod header;
mod reader;
mod writer;

pub use dedup::{DedupIndex, NameRecord};
pub use header::{LogFileHeader, Section};
pub use reader::LogReader;
pub use writer::LogWriter;

use std::io::{Read, Seek, Write};

use bytes::{Buf, BufMut};
use chatlog_core::{Error, Log, Result};
use serde::{Deserialize, Serialize};

/// Bytes before the first width-dependent field: mode, endianness, reserved
pub const PREFIX_SIZE: usize = 8;

/// Reserved bytes after mode and endianness
pub const RESERVED_SIZE: usize = 6;

/// Number of width-dependent fields in the header
pub const HEADER_FIELD_COUNT: usize = 14;

/// Encoded size of one time point
pub const TIMEPOINT_SIZE: usize = 8;

/// Integer width used for every offset, size, count and index in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum FormatMode {
    Bits16 = 1,
    #[default]
    Bits32 = 2,
    Bits64 = 3,
}

impl FormatMode {
    /// Field width in bytes
    pub fn width(self) -> usize {
        match self {
            FormatMode::Bits16 => 2,
            FormatMode::Bits32 => 4,
            FormatMode::Bits64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.width() as u32 * 8
    }

    /// Largest value a field can hold
    pub fn max_value(self) -> u64 {
        match self {
            FormatMode::Bits16 => u16::MAX as u64,
            FormatMode::Bits32 => u32::MAX as u64,
            FormatMode::Bits64 => u64::MAX,
        }
    }

    /// Total header size in bytes
    pub fn header_size(self) -> usize {
        PREFIX_SIZE + HEADER_FIELD_COUNT * self.width() + chatlog_core::TimePeriod::ENCODED_LEN
    }
}

impl TryFrom<u8> for FormatMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(FormatMode::Bits16),
            2 => Ok(FormatMode::Bits32),
            3 => Ok(FormatMode::Bits64),
            _ => Err(Error::format(format!("unknown format mode {}", value))),
        }
    }
}

impl From<FormatMode> for u8 {
    fn from(mode: FormatMode) -> u8 {
        mode as u8
    }
}

/// Byte order of every multi-byte integer in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Endianness {
    Big = 1,
    Little = 2,
}

impl Endianness {
    /// Byte order of the running host
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    /// The opposite byte order
    pub fn swapped(self) -> Self {
        match self {
            Endianness::Big => Endianness::Little,
            Endianness::Little => Endianness::Big,
        }
    }
}

impl TryFrom<u8> for Endianness {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Endianness::Big),
            2 => Ok(Endianness::Little),
            _ => Err(Error::format(format!("unknown endianness tag {}", value))),
        }
    }
}

/// Reads and writes width-dependent fields for one (mode, endianness) pair.
///
/// This is the only place field width and byte order are interpreted; the
/// header and every record go through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCodec {
    mode: FormatMode,
    endianness: Endianness,
}

impl FieldCodec {
    pub fn new(mode: FormatMode, endianness: Endianness) -> Self {
        Self { mode, endianness }
    }

    pub fn mode(&self) -> FormatMode {
        self.mode
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Field width in bytes
    pub fn width(&self) -> usize {
        self.mode.width()
    }

    /// Write `value` at field width. Fails with `Capacity` if it does not fit.
    pub fn put_field(&self, buf: &mut impl BufMut, field: &'static str, value: u64) -> Result<()> {
        if value > self.mode.max_value() {
            return Err(Error::Capacity {
                field,
                value,
                bits: self.mode.bits(),
            });
        }

        match (self.mode, self.endianness) {
            (FormatMode::Bits16, Endianness::Big) => buf.put_u16(value as u16),
            (FormatMode::Bits16, Endianness::Little) => buf.put_u16_le(value as u16),
            (FormatMode::Bits32, Endianness::Big) => buf.put_u32(value as u32),
            (FormatMode::Bits32, Endianness::Little) => buf.put_u32_le(value as u32),
            (FormatMode::Bits64, Endianness::Big) => buf.put_u64(value),
            (FormatMode::Bits64, Endianness::Little) => buf.put_u64_le(value),
        }
        Ok(())
    }

    /// Write a fixed 64-bit signed value (time points and periods)
    pub fn put_i64(&self, buf: &mut impl BufMut, value: i64) {
        match self.endianness {
            Endianness::Big => buf.put_i64(value),
            Endianness::Little => buf.put_i64_le(value),
        }
    }

    /// Read one field. Fails with `Format` if the input is too short.
    pub fn get_field(&self, buf: &mut impl Buf) -> Result<u64> {
        if buf.remaining() < self.width() {
            return Err(Error::format("truncated field"));
        }

        let value = match (self.mode, self.endianness) {
            (FormatMode::Bits16, Endianness::Big) => buf.get_u16() as u64,
            (FormatMode::Bits16, Endianness::Little) => buf.get_u16_le() as u64,
            (FormatMode::Bits32, Endianness::Big) => buf.get_u32() as u64,
            (FormatMode::Bits32, Endianness::Little) => buf.get_u32_le() as u64,
            (FormatMode::Bits64, Endianness::Big) => buf.get_u64(),
            (FormatMode::Bits64, Endianness::Little) => buf.get_u64_le(),
        };
        Ok(value)
    }

    /// Read a fixed 64-bit signed value
    pub fn get_i64(&self, buf: &mut impl Buf) -> Result<i64> {
        if buf.remaining() < TIMEPOINT_SIZE {
            return Err(Error::format("truncated time value"));
        }

        Ok(match self.endianness {
            Endianness::Big => buf.get_i64(),
            Endianness::Little => buf.get_i64_le(),
        })
    }
}

/// Encode `log` with the production profile: 32-bit fields, host byte order
pub fn serialize_default_log_format<W: Write>(out: &mut W, log: &Log) -> Result<()> {
    LogWriter::new(FormatMode::Bits32).write(out, log)
}

/// Decode a log of any format mode.
///
/// Returns None if the stream does not hold a readable log; callers treat
/// that as a missing log and regenerate it.
pub fn deserialize_default_log_format<R: Read + Seek>(input: &mut R) -> Option<Log> {
    match LogReader::new().read(input) {
        Ok(log) => Some(log),
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable log stream, treating as missing");
            None
        }
    }
}
