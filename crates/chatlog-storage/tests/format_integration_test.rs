//! Integration tests for the binary log format

use std::fs::File;
use std::io::{BufReader, Cursor, Seek, SeekFrom};

use chatlog_core::{Error, Log, LogBuilder, LogIdentifier, TimePeriod};
use chatlog_storage::format::{LogFileHeader, PREFIX_SIZE};
use chatlog_storage::{
    count_in_log, deserialize_default_log_format, serialize_default_log_format, Endianness,
    FormatMode, LogReader, LogWriter, SearchScope,
};

const MODES: [FormatMode; 3] = [FormatMode::Bits16, FormatMode::Bits32, FormatMode::Bits64];
const ORDERS: [Endianness; 2] = [Endianness::Big, Endianness::Little];

fn september() -> TimePeriod {
    TimePeriod::month(2018, 9).unwrap()
}

fn worked_example() -> Log {
    let mut builder = LogBuilder::new(LogIdentifier::channel("dota2", september()));
    builder.push(1_536_000_000_000, "bob", "hello");
    builder.push(1_536_000_060_000, "alice", "hi bob");
    builder.build().unwrap()
}

fn busy_user_log() -> Log {
    let id = LogIdentifier::user("forsen", september(), "alice");
    let names = ["alice", "bob", "carol", "dave", "ünïcödé"];
    let mut builder = LogBuilder::new(id);
    for i in 0..200i64 {
        let name = names[(i as usize * 7) % names.len()];
        builder.push(
            1_535_760_000_000 + i * 1_000,
            name,
            format!("message {} from {} LUL", i, name),
        );
    }
    builder.push(1_538_351_999_999, "carol", "");
    builder.build().unwrap()
}

fn encode(log: &Log, mode: FormatMode, endianness: Endianness) -> Vec<u8> {
    LogWriter::new(mode)
        .with_endianness(endianness)
        .encode(log)
        .unwrap()
        .to_vec()
}

// ---------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------

#[test]
fn test_worked_example() {
    let log = worked_example();
    let bytes = encode(&log, FormatMode::Bits32, Endianness::native());
    let decoded = LogReader::new().decode(&bytes).unwrap();

    assert_eq!(decoded.id(), log.id());
    assert_eq!(decoded.names().collect::<Vec<_>>(), ["alice", "bob"]);

    let lines: Vec<_> = decoded
        .lines()
        .map(|line| (line.time(), line.name(), line.message()))
        .collect();
    assert_eq!(
        lines,
        [
            (1_536_000_000_000, "bob", "hello"),
            (1_536_000_060_000, "alice", "hi bob"),
        ]
    );

    assert_eq!(count_in_log(&decoded, "bob", SearchScope::Line), 2);
    assert_eq!(count_in_log(&decoded, "bob", SearchScope::Message), 1);
}

#[test]
fn test_roundtrip_every_mode_and_order() {
    let log = busy_user_log();
    for mode in MODES {
        for endianness in ORDERS {
            let bytes = encode(&log, mode, endianness);
            let decoded = LogReader::new().decode(&bytes).unwrap();
            assert_eq!(decoded, log, "{:?} {:?}", mode, endianness);
            assert_eq!(decoded.name_count(), 5);
            assert_eq!(decoded.id().user_log_name(), Some("alice"));
        }
    }
}

#[test]
fn test_byte_orders_differ_but_decode_equal() {
    let log = worked_example();
    let big = encode(&log, FormatMode::Bits64, Endianness::Big);
    let little = encode(&log, FormatMode::Bits64, Endianness::Little);

    assert_eq!(big.len(), little.len());
    assert_ne!(big, little);
    assert_eq!(
        LogReader::new().decode(&big).unwrap(),
        LogReader::new().decode(&little).unwrap()
    );
}

#[test]
fn test_empty_log_roundtrip() {
    let log = LogBuilder::new(LogIdentifier::channel("dota2", september()))
        .build()
        .unwrap();
    for mode in MODES {
        let decoded = LogReader::new()
            .decode(&encode(&log, mode, Endianness::Little))
            .unwrap();
        assert!(decoded.is_empty());
        assert_eq!(decoded.name_count(), 0);
        assert_eq!(decoded, log);
    }
}

#[test]
fn test_roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dota2-2018-09.log");
    let log = busy_user_log();

    let mut file = File::create(&path).unwrap();
    serialize_default_log_format(&mut file, &log).unwrap();
    drop(file);

    let mut reader = BufReader::new(File::open(&path).unwrap());
    assert_eq!(deserialize_default_log_format(&mut reader), Some(log));
}

#[test]
fn test_default_format_is_32_bit_native() {
    let mut out = Vec::new();
    serialize_default_log_format(&mut out, &worked_example()).unwrap();
    assert_eq!(out[0], 2);
    assert_eq!(out[1], Endianness::native() as u8);
}

#[test]
fn test_default_decode_reads_any_mode() {
    let log = worked_example();
    for mode in MODES {
        let bytes = encode(&log, mode, Endianness::Big);
        assert_eq!(
            deserialize_default_log_format(&mut Cursor::new(bytes)),
            Some(log.clone())
        );
    }
}

#[test]
fn test_default_decode_of_garbage_is_none() {
    assert_eq!(deserialize_default_log_format(&mut Cursor::new(Vec::new())), None);
    assert_eq!(
        deserialize_default_log_format(&mut Cursor::new(b"not a log at all".to_vec())),
        None
    );
}

#[test]
fn test_stream_left_after_log_end() {
    // Trailing bytes after the last section are ignored
    let log = worked_example();
    let mut bytes = encode(&log, FormatMode::Bits16, Endianness::Little);
    bytes.extend_from_slice(b"trailing");
    assert_eq!(LogReader::new().decode(&bytes).unwrap(), log);
}

// ---------------------------------------------------------------
// Width boundaries
// ---------------------------------------------------------------

#[test]
fn test_16_bit_overflow_needs_wider_mode() {
    let mut builder = LogBuilder::new(LogIdentifier::channel("dota2", september()));
    for i in 0..1_000 {
        builder.push(i, "bob", "x".repeat(66));
    }
    let log = builder.build().unwrap();

    let err = LogWriter::new(FormatMode::Bits16).encode(&log).unwrap_err();
    assert!(matches!(err, Error::Capacity { bits: 16, .. }));

    for mode in [FormatMode::Bits32, FormatMode::Bits64] {
        let decoded = LogReader::new()
            .decode(&encode(&log, mode, Endianness::native()))
            .unwrap();
        assert_eq!(decoded, log);
    }
}

#[test]
fn test_expected_mode_reader() {
    let bytes = encode(&worked_example(), FormatMode::Bits16, Endianness::Big);
    let err = LogReader::with_expected_mode(FormatMode::Bits32)
        .decode(&bytes)
        .unwrap_err();
    assert!(err.is_format());
}

// ---------------------------------------------------------------
// Corruption containment
// ---------------------------------------------------------------

/// Overwrite header field `index` of a 32-bit little-endian encoding
fn set_field(bytes: &mut [u8], index: usize, value: u32) {
    let at = PREFIX_SIZE + index * 4;
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn get_field(bytes: &[u8], index: usize) -> u32 {
    let at = PREFIX_SIZE + index * 4;
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

#[test]
fn test_every_field_past_stream_end_rejected() {
    let bytes = encode(&busy_user_log(), FormatMode::Bits32, Endianness::Little);
    for index in 0..14 {
        let mut corrupt = bytes.clone();
        set_field(&mut corrupt, index, u32::MAX);
        let err = LogReader::new().decode(&corrupt).unwrap_err();
        assert!(err.is_format(), "field {}: {}", index, err);
    }
}

#[test]
fn test_empty_section_offsets_past_stream_end_rejected() {
    let empty = LogBuilder::new(LogIdentifier::channel("dota2", september()))
        .build()
        .unwrap();
    let mut builder = LogBuilder::new(LogIdentifier::channel("dota2", september()));
    builder.push(1_536_000_000_000, "bob", "").push(1_536_000_060_000, "alice", "");
    let silent = builder.build().unwrap();

    // username_data, message_data, username_set, timepoint, username_list, message_list
    for log in [&empty, &silent] {
        let bytes = encode(log, FormatMode::Bits32, Endianness::Little);
        for index in [4, 6, 8, 10, 11, 12] {
            let mut corrupt = bytes.clone();
            set_field(&mut corrupt, index, u32::MAX);
            let err = LogReader::new().decode(&corrupt).unwrap_err();
            assert!(err.is_format(), "{} field {}: {}", log.id(), index, err);
        }
    }
}

#[test]
fn test_absent_user_log_offset_must_stay_zero() {
    let bytes = encode(&worked_example(), FormatMode::Bits32, Endianness::Little);
    let mut corrupt = bytes.clone();
    set_field(&mut corrupt, 2, u32::MAX);
    assert!(LogReader::new().decode(&corrupt).unwrap_err().is_format());
}

#[test]
fn test_every_field_off_by_one_rejected() {
    let bytes = encode(&busy_user_log(), FormatMode::Bits32, Endianness::Little);
    for index in 0..14 {
        let mut corrupt = bytes.clone();
        set_field(&mut corrupt, index, get_field(&bytes, index) + 1);
        let err = LogReader::new().decode(&corrupt).unwrap_err();
        assert!(err.is_format(), "field {}: {}", index, err);
    }
}

#[test]
fn test_every_truncation_rejected() {
    let bytes = encode(&worked_example(), FormatMode::Bits64, Endianness::Big);
    for len in 0..bytes.len() {
        assert!(
            LogReader::new().decode(&bytes[..len]).is_err(),
            "truncated to {}",
            len
        );
    }
}

#[test]
fn test_bad_tags_rejected() {
    let bytes = encode(&worked_example(), FormatMode::Bits32, Endianness::Little);

    for (at, value) in [(0, 0u8), (0, 4), (1, 0), (1, 3), (2, 1), (7, 0xFF)] {
        let mut corrupt = bytes.clone();
        corrupt[at] = value;
        assert!(
            LogReader::new().decode(&corrupt).unwrap_err().is_format(),
            "byte {} = {}",
            at,
            value
        );
    }
}

#[test]
fn test_single_byte_flips_never_panic() {
    let bytes = encode(&worked_example(), FormatMode::Bits16, Endianness::Big);
    for at in 0..bytes.len() {
        for mask in [0x01u8, 0x80, 0xFF] {
            let mut corrupt = bytes.clone();
            corrupt[at] ^= mask;
            // Flips in text bytes may still decode; the result just must not panic
            let _ = LogReader::new().decode(&corrupt);
        }
    }
}

#[test]
fn test_reader_leaves_stream_usable() {
    let log = worked_example();
    let bytes = encode(&log, FormatMode::Bits32, Endianness::Little);
    let mut cursor = Cursor::new(bytes.clone());

    assert_eq!(LogReader::new().read(&mut cursor).unwrap(), log);
    cursor.seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(LogReader::new().read(&mut cursor).unwrap(), log);

    let header = LogFileHeader::decode(&bytes).unwrap();
    assert_eq!(header.number_of_lines, 2);
}
