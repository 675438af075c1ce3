// ABOUTME: Line-buffering Server-Sent Events parser for chat-completion streams
// ABOUTME: Handles partial lines and split UTF-8 sequences across network chunks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

//! # SSE Stream Parser
//!
//! TCP chunks do not line up with SSE event boundaries. A chunk may carry
//! several `data:` lines, half of one, or even half of a multi-byte character
//! (Spanish replies are full of them). Bytes are buffered until a `\n`
//! arrives, and only complete lines are decoded.

use std::mem;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// A parsed SSE event from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload with the prefix stripped
    Data(String),
    /// The `[DONE]` termination signal
    Done,
}

impl SseEvent {
    fn to_line(&self) -> String {
        match self {
            Self::Data(payload) => format!("{DATA_PREFIX}{payload}\n"),
            Self::Done => format!("{DATA_PREFIX}{DONE_MARKER}\n"),
        }
    }
}

/// Line-buffering SSE parser
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    /// Bytes not yet terminated by a newline
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    /// Create a new empty line buffer
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Append a network chunk and return the events of every completed line
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Drain whatever is left once the byte stream ends
    pub fn flush(&mut self) -> Vec<SseEvent> {
        let remaining = mem::take(&mut self.buffer);
        String::from_utf8_lossy(&remaining)
            .split('\n')
            .filter_map(parse_line)
            .collect()
    }

    /// Put events back in front of the buffer, in order, to be re-read later
    pub fn unread(&mut self, events: &[SseEvent]) {
        if events.is_empty() {
            return;
        }
        let mut restored: Vec<u8> = events.iter().flat_map(|e| e.to_line().into_bytes()).collect();
        restored.append(&mut self.buffer);
        self.buffer = restored;
    }

    /// True when no partial line is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Blank lines, `:` comments and non-data fields yield nothing
fn parse_line(raw: &str) -> Option<SseEvent> {
    let line = raw.trim_end_matches('\n').trim_end_matches('\r');
    if line.trim().is_empty() || line.starts_with(':') {
        return None;
    }
    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload.trim() == DONE_MARKER {
        return Some(SseEvent::Done);
    }
    if payload.trim().is_empty() {
        return None;
    }
    Some(SseEvent::Data(payload.to_owned()))
}
