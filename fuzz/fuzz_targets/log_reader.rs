#![no_main]

use chatlog_storage::{Endianness, FormatMode, LogReader, LogWriter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes to the log reader.
    // The reader must reject malformed inputs without panicking:
    // - Unknown format mode or endianness tags
    // - Truncated headers and sections
    // - Offsets and sizes past the stream end or overlapping
    // - Name indices out of range
    // - Records splitting UTF-8 characters
    let Ok(log) = LogReader::new().decode(data) else {
        return;
    };

    // Anything that decodes must re-encode at 64-bit and decode to the same log
    let bytes = LogWriter::new(FormatMode::Bits64)
        .with_endianness(Endianness::Little)
        .encode(&log)
        .expect("64-bit fields hold any decoded log");
    let again = LogReader::new().decode(&bytes).expect("re-encoded log decodes");
    assert_eq!(again, log);
});
