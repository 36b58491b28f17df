/// One replayable unit decoded from the log container.
/// `payload` is opaque bytes — the engine never interprets them.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Capture timestamp in microseconds — non-decreasing across the log.
    pub timestamp_us: i64,
    /// Logical topic the message was originally published on. Never empty.
    pub channel: String,
    /// Opaque bytes — neither the engine nor the publisher interpret their contents.
    pub payload: Vec<u8>,
}
