//! Log file header: section table plus format tags.

use bytes::{Buf, BufMut};
use chatlog_core::{Error, Result, TimePeriod};

use super::{Endianness, FieldCodec, FormatMode, PREFIX_SIZE, RESERVED_SIZE, TIMEPOINT_SIZE};

/// Position and size of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Section {
    /// Absolute file offset
    pub offset: u64,
    /// Size in bytes, or entry count for `username_set`
    pub size: u64,
}

impl Section {
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }
}

/// Decoded form of the fixed-layout header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileHeader {
    pub mode: FormatMode,
    pub endianness: Endianness,
    pub channel_name: Section,
    pub userlog_name: Section,
    pub username_data: Section,
    pub message_data: Section,
    pub username_set: Section,
    pub timepoint_list_offset: u64,
    pub username_list_offset: u64,
    pub message_list_offset: u64,
    pub number_of_lines: u64,
    pub time_period: TimePeriod,
}

impl LogFileHeader {
    pub fn codec(&self) -> FieldCodec {
        FieldCodec::new(self.mode, self.endianness)
    }

    /// Append the encoded header to `buf`
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let codec = self.codec();

        buf.put_u8(self.mode as u8);
        buf.put_u8(self.endianness as u8);
        buf.put_bytes(0, RESERVED_SIZE);

        codec.put_field(buf, "channel_name_offset", self.channel_name.offset)?;
        codec.put_field(buf, "channel_name_size", self.channel_name.size)?;
        codec.put_field(buf, "userlog_name_offset", self.userlog_name.offset)?;
        codec.put_field(buf, "userlog_name_size", self.userlog_name.size)?;
        codec.put_field(buf, "username_data_offset", self.username_data.offset)?;
        codec.put_field(buf, "username_data_size", self.username_data.size)?;
        codec.put_field(buf, "message_data_offset", self.message_data.offset)?;
        codec.put_field(buf, "message_data_size", self.message_data.size)?;
        codec.put_field(buf, "username_set_offset", self.username_set.offset)?;
        codec.put_field(buf, "username_set_size", self.username_set.size)?;
        codec.put_field(buf, "timepoint_list_offset", self.timepoint_list_offset)?;
        codec.put_field(buf, "username_list_offset", self.username_list_offset)?;
        codec.put_field(buf, "message_list_offset", self.message_list_offset)?;
        codec.put_field(buf, "number_of_lines", self.number_of_lines)?;

        codec.put_i64(buf, self.time_period.begin());
        codec.put_i64(buf, self.time_period.end());

        Ok(())
    }

    /// Parse a header from `data`, which must hold at least the full header
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < PREFIX_SIZE {
            return Err(Error::format("truncated header"));
        }

        let mode = FormatMode::try_from(data[0])?;
        let endianness = Endianness::try_from(data[1])?;
        if data[2..PREFIX_SIZE].iter().any(|&b| b != 0) {
            return Err(Error::format("reserved header bytes are not zero"));
        }
        if data.len() < mode.header_size() {
            return Err(Error::format("truncated header"));
        }

        let codec = FieldCodec::new(mode, endianness);
        let mut cursor = &data[PREFIX_SIZE..mode.header_size()];

        let section = |cursor: &mut &[u8]| -> Result<Section> {
            Ok(Section::new(codec.get_field(cursor)?, codec.get_field(cursor)?))
        };
        let channel_name = section(&mut cursor)?;
        let userlog_name = section(&mut cursor)?;
        let username_data = section(&mut cursor)?;
        let message_data = section(&mut cursor)?;
        let username_set = section(&mut cursor)?;

        let timepoint_list_offset = codec.get_field(&mut cursor)?;
        let username_list_offset = codec.get_field(&mut cursor)?;
        let message_list_offset = codec.get_field(&mut cursor)?;
        let number_of_lines = codec.get_field(&mut cursor)?;

        let begin = codec.get_i64(&mut cursor)?;
        let end = codec.get_i64(&mut cursor)?;
        let time_period = TimePeriod::new(begin, end)
            .map_err(|_| Error::format(format!("inverted time period {}..{}", begin, end)))?;

        debug_assert!(!cursor.has_remaining());

        Ok(Self {
            mode,
            endianness,
            channel_name,
            userlog_name,
            username_data,
            message_data,
            username_set,
            timepoint_list_offset,
            username_list_offset,
            message_list_offset,
            number_of_lines,
            time_period,
        })
    }

    /// Every section in file order as `(name, offset, byte extent)`.
    ///
    /// Fails with `Format` if an extent overflows.
    pub fn section_extents(&self) -> Result<[(&'static str, u64, u64); 8]> {
        let width = self.mode.width() as u64;
        let lines = self.number_of_lines;
        let extent = |name: &'static str, count: u64, record: u64| {
            count
                .checked_mul(record)
                .ok_or_else(|| Error::format(format!("{} size overflows", name)))
        };

        Ok([
            ("channel_name", self.channel_name.offset, self.channel_name.size),
            ("userlog_name", self.userlog_name.offset, self.userlog_name.size),
            ("username_data", self.username_data.offset, self.username_data.size),
            ("message_data", self.message_data.offset, self.message_data.size),
            (
                "username_set",
                self.username_set.offset,
                extent("username_set", self.username_set.size, 2 * width)?,
            ),
            (
                "timepoint_list",
                self.timepoint_list_offset,
                extent("timepoint_list", lines, TIMEPOINT_SIZE as u64)?,
            ),
            (
                "username_list",
                self.username_list_offset,
                extent("username_list", lines, width)?,
            ),
            (
                "message_list",
                self.message_list_offset,
                extent("message_list", lines, 2 * width)?,
            ),
        ])
    }

    /// Check every section against a stream of `stream_len` bytes.
    ///
    /// Every section, empty ones included, must lie after the header, inside
    /// the stream, and in file order without overlapping. The only exception
    /// is the `(0, 0)` user log entry of a channel log.
    pub fn validate(&self, stream_len: u64) -> Result<()> {
        let mut cursor = self.mode.header_size() as u64;

        for (name, offset, extent) in self.section_extents()? {
            if name == "userlog_name" && offset == 0 && extent == 0 {
                continue;
            }

            let end = offset
                .checked_add(extent)
                .ok_or_else(|| Error::format(format!("{} section overflows", name)))?;
            if offset < cursor {
                return Err(Error::format(format!(
                    "{} section at {} overlaps preceding data ending at {}",
                    name, offset, cursor
                )));
            }
            if end > stream_len {
                return Err(Error::format(format!(
                    "{} section {}..{} exceeds stream length {}",
                    name, offset, end, stream_len
                )));
            }
            cursor = end;
        }

        Ok(())
    }
}
