//! Incremental parser for the `text/event-stream` format.
//!
//! Follows the interpretation rules of the
//! [HTML Living Standard](https://html.spec.whatwg.org/multipage/server-sent-events.html):
//! `data` lines accumulate, a blank line dispatches, comments (`:` prefix) are skipped,
//! and CR, LF or CRLF all end a line. Bytes left over when the stream ends belong to an
//! event that was never dispatched and are discarded, including a final lone CR.

use bytes::{Buf, BytesMut};
use std::time::Duration;
use tracing::warn;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Longest line the parser buffers. Longer lines are dropped up to their line ending.
pub const MAX_LINE_LEN: usize = 1024 * 1024;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The last event id seen on the stream, if any.
    pub id: Option<String>,
    /// The `event` field, if the server set one.
    pub event_type: Option<String>,
    pub data: String,
    /// Reconnection delay advertised by the server.
    pub retry: Option<Duration>,
}

/// Accumulates bytes and yields events as they complete.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: BytesMut,
    data: String,
    has_data: bool,
    event_type: Option<String>,
    last_id: Option<String>,
    retry: Option<Duration>,
    /// Set while skipping the remainder of an oversized line.
    discarding: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some((line_end, rest_start)) = find_eol(&self.buffer) {
            let line = self.buffer.split_to(line_end);
            self.buffer.advance(rest_start - line_end);
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_LINE_LEN {
            warn!(len = self.buffer.len(), "Event stream line too long, dropping it");
            self.buffer.clear();
            self.discarding = true;
        }
        events
    }

    fn process_line(&mut self, line: &[u8]) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line[0] == b':' {
            return None;
        }

        let (field, value) = match line.iter().position(|&b| b == b':') {
            Some(colon) => {
                let value = &line[colon + 1..];
                let value = value.strip_prefix(b" ").unwrap_or(value);
                (&line[..colon], value)
            }
            None => (line, &b""[..]),
        };
        let value = String::from_utf8_lossy(value);

        match field {
            b"data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(&value);
                self.has_data = true;
            }
            b"event" => self.event_type = Some(value.into_owned()),
            // An id containing NUL is ignored per the standard.
            b"id" if !value.contains('\0') => self.last_id = Some(value.into_owned()),
            b"retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = self.event_type.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseEvent {
            id: self.last_id.clone(),
            event_type,
            data: std::mem::take(&mut self.data),
            retry: self.retry,
        })
    }
}

/// Returns `(line_end, rest_start)`, or `None` when more bytes are needed. A trailing
/// lone CR waits for the next chunk in case it is the first half of a CRLF.
fn find_eol(bytes: &[u8]) -> Option<(usize, usize)> {
    let pos = bytes.iter().position(|&b| b == CR || b == LF)?;
    match bytes[pos] {
        LF => Some((pos, pos + 1)),
        _ if pos + 1 >= bytes.len() => None,
        _ if bytes[pos + 1] == LF => Some((pos, pos + 2)),
        _ => Some((pos, pos + 1)),
    }
}
