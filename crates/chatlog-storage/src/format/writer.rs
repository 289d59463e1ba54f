//! Log Writer - Encoding a Log into the File Format
//!
//! This module implements `LogWriter`, which turns a complete in-memory `Log`
//! into the byte layout described in the format module.
//!
//! ## What Does LogWriter Do?
//!
//! 1. **Builds the dedup index**: one name record per distinct author and one
//!    table index per line (binary search over the sorted names)
//! 2. **Builds the message list**: `(offset, size)` per line while concatenating
//!    the message bytes in line order
//! 3. **Lays out sections** contiguously after the header, in fixed order; the
//!    cursor after each section is the next section's offset
//! 4. **Encodes** header and sections into one buffer at the selected width and
//!    byte order
//! 5. **Writes** the buffer to the sink in one call
//!
//! ## Capacity
//!
//! Every offset, size, count and index must fit in the field width of the
//! selected `FormatMode`. If one does not, encoding fails with
//! `Error::Capacity` before a single byte reaches the sink; re-encode with a
//! wider mode.
//!
//! ## Example Usage
//!
//! ```ignore
//! use chatlog_storage::format::{FormatMode, LogWriter};
//!
//! let writer = LogWriter::new(FormatMode::Bits32);
//! let mut file = File::create(path)?;
//! writer.write(&mut file, &log)?;
//! ```
//!
//! ## Thread Safety
//!
//! `LogWriter` holds only its settings and is `Copy`. Encoding different logs
//! to different sinks from several threads is safe.

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};
use chatlog_core::{Log, Result};

use super::dedup::DedupIndex;
use super::header::{LogFileHeader, Section};
use super::{Endianness, FieldCodec, FormatMode, TIMEPOINT_SIZE};

/// Encodes logs at one format mode and byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogWriter {
    codec: FieldCodec,
}

impl LogWriter {
    /// Create a writer for `mode` using the host's byte order
    pub fn new(mode: FormatMode) -> Self {
        Self {
            codec: FieldCodec::new(mode, Endianness::native()),
        }
    }

    /// Override the byte order recorded in the file
    pub fn with_endianness(self, endianness: Endianness) -> Self {
        Self {
            codec: FieldCodec::new(self.codec.mode(), endianness),
        }
    }

    pub fn mode(&self) -> FormatMode {
        self.codec.mode()
    }

    pub fn endianness(&self) -> Endianness {
        self.codec.endianness()
    }

    /// Encode `log` and write it to `out`
    pub fn write<W: Write>(&self, out: &mut W, log: &Log) -> Result<()> {
        let bytes = self.encode(log)?;
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Encode `log` into a new buffer
    pub fn encode(&self, log: &Log) -> Result<Bytes> {
        let index = DedupIndex::from_log(log)?;

        let mut message_list = Vec::with_capacity(log.len());
        let mut message_data_len = 0u64;
        for line in log.lines() {
            let size = line.message().len() as u64;
            message_list.push((message_data_len, size));
            message_data_len += size;
        }

        let header = self.layout(log, &index, message_data_len);
        let total_len = header.message_list_offset + 2 * self.codec.width() as u64 * log.len() as u64;

        let mut buf = BytesMut::with_capacity(usize::try_from(total_len).unwrap_or(0));

        // 1. Header
        header.encode(&mut buf)?;

        // 2. Identifier strings
        let id = log.id();
        buf.put_slice(id.channel_name().as_bytes());
        if let Some(user) = id.user_log_name() {
            buf.put_slice(user.as_bytes());
        }

        // 3. Name bytes, then message bytes
        for name in log.names() {
            buf.put_slice(name.as_bytes());
        }
        for line in log.lines() {
            buf.put_slice(line.message().as_bytes());
        }

        // 4. Name table
        for record in &index.records {
            self.codec.put_field(&mut buf, "username_set offset", record.offset)?;
            self.codec.put_field(&mut buf, "username_set size", record.size)?;
        }

        // 5. Per-line records
        for line in log.lines() {
            self.codec.put_i64(&mut buf, line.time());
        }
        for &name_index in &index.line_indices {
            self.codec.put_field(&mut buf, "username_list index", name_index)?;
        }
        for &(offset, size) in &message_list {
            self.codec.put_field(&mut buf, "message_list offset", offset)?;
            self.codec.put_field(&mut buf, "message_list size", size)?;
        }

        debug_assert_eq!(buf.len() as u64, total_len);

        tracing::debug!(
            log = %id,
            mode = ?self.codec.mode(),
            lines = log.len(),
            names = index.len(),
            bytes = buf.len(),
            "Encoded log"
        );

        Ok(buf.freeze())
    }

    /// Compute the header: every section placed right after the previous one
    fn layout(&self, log: &Log, index: &DedupIndex, message_data_len: u64) -> LogFileHeader {
        let width = self.codec.width() as u64;
        let lines = log.len() as u64;
        let id = log.id();

        let mut cursor = self.codec.mode().header_size() as u64;
        let mut place = |size: u64| {
            let section = Section::new(cursor, size);
            cursor += size;
            section
        };

        let channel_name = place(id.channel_name().len() as u64);
        let userlog_name = match id.user_log_name() {
            Some(user) => place(user.len() as u64),
            None => Section::new(0, 0),
        };
        let username_data = place(index.data_len);
        let message_data = place(message_data_len);

        let username_set_count = index.len() as u64;
        let username_set = Section::new(place(username_set_count * 2 * width).offset, username_set_count);
        let timepoint_list_offset = place(lines * TIMEPOINT_SIZE as u64).offset;
        let username_list_offset = place(lines * width).offset;
        let message_list_offset = place(lines * 2 * width).offset;

        LogFileHeader {
            mode: self.codec.mode(),
            endianness: self.codec.endianness(),
            channel_name,
            userlog_name,
            username_data,
            message_data,
            username_set,
            timepoint_list_offset,
            username_list_offset,
            message_list_offset,
            number_of_lines: lines,
            time_period: *id.period(),
        }
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new(FormatMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::LogReader;
    use chatlog_core::{Error, LogBuilder, LogIdentifier, TimePeriod};

    fn dota2() -> LogIdentifier {
        LogIdentifier::channel("dota2", TimePeriod::month(2018, 9).unwrap())
    }

    fn sample_log() -> Log {
        let mut builder = LogBuilder::new(dota2());
        builder.push(1_536_000_000_000, "bob", "hello");
        builder.push(1_536_000_060_000, "alice", "hi bob");
        builder.build().unwrap()
    }

    #[test]
    fn test_encode_starts_with_tags() {
        let bytes = LogWriter::new(FormatMode::Bits32)
            .with_endianness(Endianness::Big)
            .encode(&sample_log())
            .unwrap();
        assert_eq!(bytes[0], 2);
        assert_eq!(bytes[1], Endianness::Big as u8);
        assert_eq!(&bytes[2..8], &[0u8; 6]);
    }

    #[test]
    fn test_sections_follow_header_in_order() {
        let log = sample_log();
        let bytes = LogWriter::new(FormatMode::Bits32).encode(&log).unwrap();
        let header = LogFileHeader::decode(&bytes).unwrap();

        assert_eq!(header.channel_name, Section::new(80, 5));
        assert_eq!(header.userlog_name, Section::new(0, 0));
        assert_eq!(header.username_data, Section::new(85, 8));
        assert_eq!(header.message_data, Section::new(93, 11));
        assert_eq!(header.username_set, Section::new(104, 2));
        assert_eq!(header.timepoint_list_offset, 120);
        assert_eq!(header.username_list_offset, 136);
        assert_eq!(header.message_list_offset, 144);
        assert_eq!(header.number_of_lines, 2);
        assert_eq!(bytes.len(), 160);

        assert_eq!(&bytes[80..85], b"dota2");
        assert_eq!(&bytes[85..93], b"alicebob");
        assert_eq!(&bytes[93..104], b"hellohi bob");
    }

    #[test]
    fn test_user_log_section() {
        let id = LogIdentifier::user("dota2", TimePeriod::month(2018, 9).unwrap(), "alice");
        let mut builder = LogBuilder::new(id);
        builder.push(1, "alice", "gg");
        let bytes = LogWriter::new(FormatMode::Bits16).encode(&builder.build().unwrap()).unwrap();
        let header = LogFileHeader::decode(&bytes).unwrap();

        assert_eq!(header.channel_name, Section::new(52, 5));
        assert_eq!(header.userlog_name, Section::new(57, 5));
        assert_eq!(header.username_data.offset, 62);
        assert_eq!(&bytes[57..62], b"alice");
    }

    #[test]
    fn test_username_list_holds_table_indices() {
        let log = sample_log();
        let bytes = LogWriter::new(FormatMode::Bits16)
            .with_endianness(Endianness::Little)
            .encode(&log)
            .unwrap();
        let header = LogFileHeader::decode(&bytes).unwrap();

        let start = header.username_list_offset as usize;
        let first = u16::from_le_bytes([bytes[start], bytes[start + 1]]);
        let second = u16::from_le_bytes([bytes[start + 2], bytes[start + 3]]);
        // "bob" is entry 1, "alice" entry 0
        assert_eq!((first, second), (1, 0));
    }

    #[test]
    fn test_timepoints_in_declared_order() {
        let log = sample_log();
        let bytes = LogWriter::new(FormatMode::Bits32)
            .with_endianness(Endianness::Big)
            .encode(&log)
            .unwrap();
        let header = LogFileHeader::decode(&bytes).unwrap();

        let start = header.timepoint_list_offset as usize;
        let t = i64::from_be_bytes(bytes[start..start + 8].try_into().unwrap());
        assert_eq!(t, 1_536_000_000_000);
    }

    #[test]
    fn test_empty_log() {
        let log = LogBuilder::new(dota2()).build().unwrap();
        let bytes = LogWriter::new(FormatMode::Bits32).encode(&log).unwrap();
        assert_eq!(bytes.len(), 80 + 5);

        let decoded = LogReader::new().decode(&bytes).unwrap();
        assert_eq!(decoded, log);
    }

    // ---------------------------------------------------------------
    // Capacity limits
    // ---------------------------------------------------------------

    #[test]
    fn test_capacity_error_at_16_bit() {
        let mut builder = LogBuilder::new(dota2());
        builder.push(1, "bob", "x".repeat(65_536));
        let log = builder.build().unwrap();

        let err = LogWriter::new(FormatMode::Bits16).encode(&log).unwrap_err();
        assert!(matches!(err, Error::Capacity { bits: 16, .. }));

        LogWriter::new(FormatMode::Bits32).encode(&log).unwrap();
    }

    #[test]
    fn test_capacity_error_writes_nothing() {
        let mut builder = LogBuilder::new(dota2());
        builder.push(1, "bob", "x".repeat(70_000));
        let log = builder.build().unwrap();

        let mut sink = Vec::new();
        assert!(LogWriter::new(FormatMode::Bits16)
            .write(&mut sink, &log)
            .is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_largest_16_bit_field_fits() {
        // message_list_offset is the largest field; size the message so it lands on 65535
        let header_and_fixed = 52 + 5 + 3 + 2 * 2 + 8 + 2;
        let mut builder = LogBuilder::new(dota2());
        builder.push(1, "bob", "y".repeat(65_535 - header_and_fixed));
        let log = builder.build().unwrap();

        let bytes = LogWriter::new(FormatMode::Bits16).encode(&log).unwrap();
        let header = LogFileHeader::decode(&bytes).unwrap();
        assert_eq!(header.message_list_offset, 65_535);
    }
}
