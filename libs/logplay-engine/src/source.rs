//! Streaming decoder over the on-disk log container.
//!
//! Entry layout (big-endian):
//! - Sync word: u32 = 0xEDA1DA01
//! - Event number: u64
//! - Capture timestamp: u64 (microseconds)
//! - Channel length: u32
//! - Payload length: u32
//! - Channel bytes (UTF-8, no terminator), then payload bytes

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::ReplayError;
use crate::record::EventRecord;

/// Sync word opening every entry.
const SYNC_WORD: u32 = 0xEDA1_DA01;

/// Fixed entry header size.
const HEADER_LEN: usize = 28;

/// Channel names longer than this cannot come from a well-formed log.
const MAX_CHANNEL_LEN: u32 = 256;

/// Payloads larger than this cannot come from a well-formed log.
const MAX_PAYLOAD_LEN: u32 = 1 << 28;

/// Forward-only cursor over a log container.
///
/// Entries stream out one at a time in capture order; the whole log is
/// never held in memory. Not restartable — replaying from the start
/// requires a fresh `open`. A malformed entry stops decoding at that
/// point; there is no resynchronization.
pub struct EventLog {
    reader: BufReader<File>,
    /// Byte offset of the next entry header.
    offset: u64,
}

impl EventLog {
    /// Open a log container for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| ReplayError::open(path.display().to_string(), e))?;
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
        })
    }

    /// Decode the next entry. Returns `Ok(None)` once the container is
    /// exhausted; end of file anywhere other than an entry boundary is a
    /// corrupt entry, reported with the entry's byte offset.
    pub fn next_record(&mut self) -> Result<Option<EventRecord>, ReplayError> {
        let entry_offset = self.offset;

        let mut header = [0u8; HEADER_LEN];
        let got = read_full(&mut self.reader, &mut header)
            .map_err(|e| ReplayError::corrupt(entry_offset, e.to_string()))?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_LEN {
            return Err(ReplayError::corrupt(
                entry_offset,
                format!("truncated entry header ({got} of {HEADER_LEN} bytes)"),
            ));
        }

        let sync = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        if sync != SYNC_WORD {
            return Err(ReplayError::corrupt(
                entry_offset,
                format!("bad sync word 0x{sync:08x}"),
            ));
        }
        let timestamp_us = u64::from_be_bytes([
            header[12], header[13], header[14], header[15], header[16], header[17], header[18],
            header[19],
        ]) as i64;
        let channel_len = u32::from_be_bytes([header[20], header[21], header[22], header[23]]);
        let payload_len = u32::from_be_bytes([header[24], header[25], header[26], header[27]]);

        if channel_len == 0 || channel_len > MAX_CHANNEL_LEN {
            return Err(ReplayError::corrupt(
                entry_offset,
                format!("implausible channel length {channel_len}"),
            ));
        }
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(ReplayError::corrupt(
                entry_offset,
                format!("implausible payload length {payload_len}"),
            ));
        }

        let mut channel = vec![0u8; channel_len as usize];
        self.reader
            .read_exact(&mut channel)
            .map_err(|e| ReplayError::corrupt(entry_offset, format!("truncated channel: {e}")))?;
        let channel = String::from_utf8(channel)
            .map_err(|_| ReplayError::corrupt(entry_offset, "channel is not UTF-8"))?;

        let mut payload = vec![0u8; payload_len as usize];
        self.reader
            .read_exact(&mut payload)
            .map_err(|e| ReplayError::corrupt(entry_offset, format!("truncated payload: {e}")))?;

        self.offset += (HEADER_LEN as u64) + u64::from(channel_len) + u64::from(payload_len);
        Ok(Some(EventRecord {
            timestamp_us,
            channel,
            payload,
        }))
    }
}

/// Read until `buf` is full or the stream ends. Returns bytes read, so
/// the caller can tell a clean end of log (0) from a truncated entry.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        let n = reader.read(&mut buf[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(read)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn entry(event_num: u64, ts_us: u64, channel: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SYNC_WORD.to_be_bytes());
        buf.extend_from_slice(&event_num.to_be_bytes());
        buf.extend_from_slice(&ts_us.to_be_bytes());
        buf.extend_from_slice(&(channel.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(channel);
        buf.extend_from_slice(payload);
        buf
    }

    fn log_with(bytes: &[u8]) -> (tempfile::NamedTempFile, EventLog) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        let log = EventLog::open(file.path()).unwrap();
        (file, log)
    }

    #[test]
    fn empty_log_is_exhausted_immediately() {
        let (_file, mut log) = log_with(&[]);
        assert!(log.next_record().unwrap().is_none());
    }

    #[test]
    fn decodes_entries_in_order() {
        let mut bytes = entry(0, 10, b"POSE", b"x");
        bytes.extend(entry(1, 20, b"SCAN", b"yz"));
        let (_file, mut log) = log_with(&bytes);

        let first = log.next_record().unwrap().unwrap();
        assert_eq!(first.timestamp_us, 10);
        assert_eq!(first.channel, "POSE");
        assert_eq!(first.payload, b"x");

        let second = log.next_record().unwrap().unwrap();
        assert_eq!(second.timestamp_us, 20);
        assert_eq!(second.channel, "SCAN");
        assert_eq!(second.payload, b"yz");

        assert!(log.next_record().unwrap().is_none());
    }

    #[test]
    fn truncated_second_entry_reports_its_offset() {
        let first = entry(0, 10, b"POSE", b"x");
        let first_len = first.len() as u64;
        let mut bytes = first;
        bytes.extend_from_slice(&SYNC_WORD.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 6]);
        let (_file, mut log) = log_with(&bytes);

        assert!(log.next_record().unwrap().is_some());
        match log.next_record() {
            Err(ReplayError::CorruptRecord { offset, .. }) => assert_eq!(offset, first_len),
            other => panic!("expected CorruptRecord, got {other:?}"),
        }
    }

    #[test]
    fn bad_sync_word_is_corrupt() {
        let mut bytes = entry(0, 10, b"POSE", b"x");
        bytes[0] ^= 0xFF;
        let (_file, mut log) = log_with(&bytes);
        assert!(matches!(
            log.next_record(),
            Err(ReplayError::CorruptRecord { offset: 0, .. })
        ));
    }

    #[test]
    fn empty_channel_is_corrupt() {
        let bytes = entry(0, 10, b"", b"x");
        let (_file, mut log) = log_with(&bytes);
        assert!(matches!(
            log.next_record(),
            Err(ReplayError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn non_utf8_channel_is_corrupt() {
        let bytes = entry(0, 10, &[0xFF, 0xFE], b"x");
        let (_file, mut log) = log_with(&bytes);
        assert!(matches!(
            log.next_record(),
            Err(ReplayError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn missing_file_is_open_error() {
        assert!(matches!(
            EventLog::open("/nonexistent/replay.log"),
            Err(ReplayError::Open { .. })
        ));
    }
}
