/// Prefix of a payload-carrying line.
pub const DATA_PREFIX: &str = "data:";

/// Payload that ends the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Classification of one wire line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Blank line, comment/heartbeat, empty payload or a field we don't use.
    Ignored,
    /// The `[DONE]` sentinel.
    Done,
    /// JSON text following the data prefix, trimmed.
    Payload(&'a str),
}

impl<'a> Frame<'a> {
    pub fn classify(line: &'a str) -> Self {
        if line.trim().is_empty() || line.starts_with(':') {
            return Frame::Ignored;
        }
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            return Frame::Ignored;
        };
        let data = data.trim();
        if data.is_empty() {
            Frame::Ignored
        } else if data == DONE_SENTINEL {
            Frame::Done
        } else {
            Frame::Payload(data)
        }
    }
}
