//! Log Reader - Decoding a Log from the File Format
//!
//! This module implements `LogReader`, which reads an encoded log from any
//! seekable byte source and rebuilds the in-memory `Log`.
//!
//! ## What Does LogReader Do?
//!
//! 1. **Parses the header** at the width and byte order the file declares
//! 2. **Validates every section** against the stream length before reading it
//! 3. **Reads the identifier** strings (channel, optional user log)
//! 4. **Allocates one buffer** holding the name bytes followed by the message
//!    bytes; every name and message view of the result aliases it
//! 5. **Resolves the name table**, the per-line name indices and the per-line
//!    message records into spans over that buffer
//! 6. **Builds the Log**, re-checking its invariants
//!
//! ## Error Handling
//!
//! Decoding is all-or-nothing: any problem yields an error and no log.
//! - `Format`: unknown mode or endianness tag, non-zero reserved bytes,
//!   sections outside the stream or out of order, name index out of range,
//!   record outside its data region, invalid UTF-8, unsorted name table
//! - `Io`: the stream failed for another reason
//!
//! Every size is checked against the stream length before any buffer is
//! allocated, so a corrupt size can never cause an oversized allocation.
//!
//! ## Example Usage
//!
//! ```ignore
//! use chatlog_storage::format::LogReader;
//!
//! let mut file = BufReader::new(File::open(path)?);
//! let log = LogReader::new().read(&mut file)?;
//!
//! for line in log.lines() {
//!     println!("{} <{}> {}", line.time(), line.name(), line.message());
//! }
//! ```

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use chatlog_core::{Error, LineSpan, Log, LogIdentifier, Result, TextSpan};

use super::header::{LogFileHeader, Section};
use super::{FieldCodec, FormatMode, PREFIX_SIZE, TIMEPOINT_SIZE};

/// Decodes logs of any (or one expected) format mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogReader {
    expected_mode: Option<FormatMode>,
}

impl LogReader {
    /// A reader accepting every format mode
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader rejecting files of any mode other than `mode`
    pub fn with_expected_mode(mode: FormatMode) -> Self {
        Self {
            expected_mode: Some(mode),
        }
    }

    /// Decode a log from an in-memory encoding
    pub fn decode(&self, data: &[u8]) -> Result<Log> {
        self.read(&mut Cursor::new(data))
    }

    /// Decode a log from `input`, which must be positioned at the file start
    pub fn read<R: Read + Seek>(&self, input: &mut R) -> Result<Log> {
        let start = input.stream_position()?;
        let stream_len = input.seek(SeekFrom::End(0))?.saturating_sub(start);
        input.seek(SeekFrom::Start(start))?;

        let header = self.read_header(input, stream_len)?;
        header.validate(stream_len)?;
        let codec = header.codec();

        // Identifier
        let channel_name = read_string(input, start, header.channel_name, "channel name")?;
        let user_log_name = if header.userlog_name.size > 0 {
            Some(read_string(input, start, header.userlog_name, "user log name")?)
        } else {
            None
        };
        let id = LogIdentifier::new(channel_name, header.time_period, user_log_name);

        // One buffer: name bytes, then message bytes. Each region is checked
        // on its own, so no character straddles the boundary.
        let name_len = to_usize(header.username_data.size, "username_data size")?;
        let message_len = to_usize(header.message_data.size, "message_data size")?;

        let mut name_bytes = Vec::with_capacity(name_len + message_len);
        name_bytes.resize(name_len, 0);
        read_at(input, start, header.username_data.offset, &mut name_bytes, "username data")?;
        let mut buffer = String::from_utf8(name_bytes)
            .map_err(|e| Error::format(format!("username data is not UTF-8: {}", e)))?;

        let mut message_data = vec![0u8; message_len];
        read_at(input, start, header.message_data.offset, &mut message_data, "message data")?;
        let messages = std::str::from_utf8(&message_data)
            .map_err(|e| Error::format(format!("message data is not UTF-8: {}", e)))?;
        buffer.push_str(messages);

        // Name table
        let name_count = to_usize(header.username_set.size, "username_set size")?;
        let set_bytes = read_records(input, start, header.username_set.offset, name_count, 2 * codec.width())?;
        let mut cursor = set_bytes.as_slice();
        let mut names = Vec::with_capacity(name_count);
        for i in 0..name_count {
            let span = read_span(&codec, &mut cursor)?;
            check_span(&buffer, span, 0, name_len, || format!("username_set entry {}", i))?;
            names.push(span);
        }

        let line_count = to_usize(header.number_of_lines, "number_of_lines")?;

        // Time points
        let time_bytes = read_records(input, start, header.timepoint_list_offset, line_count, TIMEPOINT_SIZE)?;
        let mut cursor = time_bytes.as_slice();
        let mut times = Vec::with_capacity(line_count);
        for _ in 0..line_count {
            times.push(codec.get_i64(&mut cursor)?);
        }

        // Name index per line
        let index_bytes = read_records(input, start, header.username_list_offset, line_count, codec.width())?;
        let mut cursor = index_bytes.as_slice();
        let mut line_names = Vec::with_capacity(line_count);
        for line in 0..line_count {
            let index = codec.get_field(&mut cursor)?;
            let span = usize::try_from(index)
                .ok()
                .and_then(|index| names.get(index))
                .ok_or_else(|| {
                    Error::format(format!(
                        "line {} name index {} out of range ({} names)",
                        line, index, name_count
                    ))
                })?;
            line_names.push(*span);
        }

        // Message record per line, rebased past the name bytes
        let message_bytes = read_records(input, start, header.message_list_offset, line_count, 2 * codec.width())?;
        let mut cursor = message_bytes.as_slice();
        let mut lines = Vec::with_capacity(line_count);
        for (line, (time, name)) in times.into_iter().zip(line_names).enumerate() {
            let relative = read_span(&codec, &mut cursor)?;
            let message = relative
                .shifted(name_len)
                .ok_or_else(|| Error::format(format!("message_list entry {} overflows", line)))?;
            check_span(&buffer, message, name_len, name_len + message_len, || {
                format!("message_list entry {}", line)
            })?;
            lines.push(LineSpan::new(time, name, message));
        }

        let log = Log::new(id, buffer, names, lines).map_err(|e| match e {
            Error::InvariantViolation(msg) => Error::Format(msg),
            other => other,
        })?;

        tracing::debug!(
            log = %log.id(),
            mode = ?header.mode,
            endianness = ?header.endianness,
            lines = log.len(),
            names = log.name_count(),
            bytes = stream_len,
            "Decoded log"
        );

        Ok(log)
    }

    /// Read and parse the header
    fn read_header<R: Read>(&self, input: &mut R, stream_len: u64) -> Result<LogFileHeader> {
        let mut prefix = [0u8; PREFIX_SIZE];
        read_exact(input, &mut prefix, "header")?;

        let mode = FormatMode::try_from(prefix[0])?;
        if let Some(expected) = self.expected_mode {
            if mode != expected {
                return Err(Error::format(format!(
                    "expected format mode {:?}, found {:?}",
                    expected, mode
                )));
            }
        }

        let header_size = mode.header_size();
        if stream_len < header_size as u64 {
            return Err(Error::format(format!(
                "stream of {} bytes is shorter than the {}-byte header",
                stream_len, header_size
            )));
        }

        let mut raw = vec![0u8; header_size];
        raw[..PREFIX_SIZE].copy_from_slice(&prefix);
        read_exact(input, &mut raw[PREFIX_SIZE..], "header")?;

        LogFileHeader::decode(&raw)
    }
}

fn to_usize(value: u64, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::format(format!("{} {} too large", what, value)))
}

/// `read_exact` with end-of-stream reported as a format error
fn read_exact<R: Read>(input: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    input.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::format(format!("truncated {}", what)),
        _ => Error::Io(e),
    })
}

/// Fill `buf` from absolute offset `offset` (relative to the file start `base`)
fn read_at<R: Read + Seek>(
    input: &mut R,
    base: u64,
    offset: u64,
    buf: &mut [u8],
    what: &str,
) -> Result<()> {
    if buf.is_empty() {
        return Ok(());
    }
    let position = base
        .checked_add(offset)
        .ok_or_else(|| Error::format(format!("{} offset overflows", what)))?;
    input.seek(SeekFrom::Start(position))?;
    read_exact(input, buf, what)
}

fn read_string<R: Read + Seek>(input: &mut R, base: u64, section: Section, what: &str) -> Result<String> {
    let mut bytes = vec![0u8; to_usize(section.size, what)?];
    read_at(input, base, section.offset, &mut bytes, what)?;
    String::from_utf8(bytes).map_err(|e| Error::format(format!("{} is not UTF-8: {}", what, e)))
}

/// Read `count` fixed-size records starting at `offset`.
///
/// The section was validated against the stream length, so the allocation is
/// bounded by the stream size.
fn read_records<R: Read + Seek>(
    input: &mut R,
    base: u64,
    offset: u64,
    count: usize,
    record_size: usize,
) -> Result<Vec<u8>> {
    let len = count
        .checked_mul(record_size)
        .ok_or_else(|| Error::format("record section too large"))?;
    let mut bytes = vec![0u8; len];
    read_at(input, base, offset, &mut bytes, "record section")?;
    Ok(bytes)
}

fn read_span(codec: &FieldCodec, cursor: &mut &[u8]) -> Result<TextSpan> {
    let offset = to_usize(codec.get_field(cursor)?, "record offset")?;
    let size = to_usize(codec.get_field(cursor)?, "record size")?;
    Ok(TextSpan::new(offset, size))
}

/// Require `span` to lie within `[region_start, region_end)` of `buffer`
/// on character boundaries
fn check_span(
    buffer: &str,
    span: TextSpan,
    region_start: usize,
    region_end: usize,
    what: impl Fn() -> String,
) -> Result<()> {
    let inside = span.offset() >= region_start
        && span.checked_end().is_some_and(|end| end <= region_end)
        && span.resolve(buffer).is_some();
    if inside {
        Ok(())
    } else {
        Err(Error::format(format!(
            "{} ({}..+{}) lies outside its data region",
            what(),
            span.offset(),
            span.len()
        )))
    }
}
