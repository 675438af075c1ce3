// ABOUTME: Client-side accumulation of the coach's SSE reply into one growing message
// ABOUTME: Partial JSON lines are pushed back and retried when more bytes arrive
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::llm::sse_parser::{SseEvent, SseLineBuffer};

#[derive(Debug, Deserialize)]
struct DeltaChunk {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

fn parse_delta(payload: &str) -> Result<Option<String>, serde_json::Error> {
    let chunk: DeltaChunk = serde_json::from_str(payload)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

/// Builds the assistant reply from `data:` lines of an OpenAI-style stream
#[derive(Debug, Default)]
pub struct ChatStreamAccumulator {
    lines: SseLineBuffer,
    reply: String,
    done: bool,
}

impl ChatStreamAccumulator {
    /// Create an empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk, returning new content fragments in arrival order
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        let events = self.lines.feed(bytes);
        self.apply(&events, false)
    }

    /// Process whatever is still buffered once the stream has ended
    ///
    /// Lines that still fail to parse are dropped.
    pub fn finish(&mut self) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        let events = self.lines.flush();
        self.apply(&events, true)
    }

    fn apply(&mut self, events: &[SseEvent], best_effort: bool) -> Vec<String> {
        let mut fragments = Vec::new();
        for (index, event) in events.iter().enumerate() {
            match event {
                SseEvent::Done => {
                    self.done = true;
                    break;
                }
                SseEvent::Data(payload) => match parse_delta(payload) {
                    Ok(Some(text)) => {
                        self.reply.push_str(&text);
                        fragments.push(text);
                    }
                    Ok(None) => {}
                    Err(e) if best_effort => debug!("Dropping unparseable stream line: {e}"),
                    Err(_) => {
                        self.lines.unread(&events[index..]);
                        break;
                    }
                },
            }
        }
        fragments
    }

    /// True once `[DONE]` has been seen
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Text accumulated so far
    #[must_use]
    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// Take the accumulated text
    #[must_use]
    pub fn into_reply(self) -> String {
        self.reply
    }
}

/// Drain a byte stream into the full assistant reply
///
/// # Errors
///
/// Returns the first stream error; the partial reply is discarded
pub async fn collect_reply<S, E>(stream: S) -> AppResult<String>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Into<AppError>,
{
    collect_reply_with(stream, |_| {}).await
}

/// Like [`collect_reply`], calling `on_fragment` for each new piece of text
///
/// # Errors
///
/// Returns the first stream error; the partial reply is discarded
pub async fn collect_reply_with<S, E, F>(stream: S, mut on_fragment: F) -> AppResult<String>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Into<AppError>,
    F: FnMut(&str) + Send,
{
    let mut stream = Box::pin(stream);
    let mut accumulator = ChatStreamAccumulator::new();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(Into::into)?;
        for fragment in accumulator.feed(&bytes) {
            on_fragment(&fragment);
        }
        if accumulator.is_done() {
            break;
        }
    }
    for fragment in accumulator.finish() {
        on_fragment(&fragment);
    }
    Ok(accumulator.into_reply())
}
