//! Incremental SSE reading: lines, then typed frames.
//!
//! [`LineReader`] pulls one `\n`-terminated line at a time from the
//! response body without reading past the next newline already in the
//! buffer. [`FrameReader`] pairs `event:` lines with their `data:`
//! payload, tolerates standalone `data:` lines, skips pings, comments,
//! and `[DONE]` sentinels, and yields each frame as a JSON value whose
//! `type` field carries the event name.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};

use rivulet_core::error::Error;

/// The raw byte source a reader pulls from, with transport errors
/// already mapped into the public taxonomy.
pub(crate) type ByteSource = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// Reads one line at a time from a byte stream.
pub(crate) struct LineReader {
    source: ByteSource,
    buf: Vec<u8>,
    eof: bool,
}

impl LineReader {
    pub(crate) fn new(source: ByteSource) -> Self {
        Self {
            source,
            buf: Vec::new(),
            eof: false,
        }
    }

    /// Returns the next line without its terminator, or `None` at end
    /// of stream. The final line is returned even if the stream ended
    /// without a trailing newline.
    pub(crate) async fn next_line(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            if self.eof {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.buf);
                return Ok(Some(String::from_utf8_lossy(&rest).into_owned()));
            }

            match self.source.next().await {
                Some(Ok(bytes)) => self.buf.extend_from_slice(&bytes),
                Some(Err(e)) => return Err(e),
                None => self.eof = true,
            }
        }
    }
}

/// Groups lines into tagged event frames.
pub(crate) struct FrameReader {
    lines: LineReader,
}

impl FrameReader {
    pub(crate) fn new(source: ByteSource) -> Self {
        Self {
            lines: LineReader::new(source),
        }
    }

    /// Returns the next decoded frame, or `None` at end of stream.
    ///
    /// A malformed JSON payload on a non-empty `data:` line is a fatal
    /// [`Error::ChunkDecode`].
    pub(crate) async fn next_frame(&mut self) -> Result<Option<Value>, Error> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };

            if let Some(name) = line.strip_prefix("event:") {
                let name = name.trim();
                if name == "ping" {
                    return Ok(Some(json!({"type": "ping"})));
                }

                let Some(data_line) = self.lines.next_line().await? else {
                    return Ok(Some(json!({"type": name})));
                };
                let Some(payload) = data_line.strip_prefix("data:") else {
                    return Ok(Some(json!({"type": name})));
                };
                let payload = payload.trim();
                if payload.is_empty() {
                    return Ok(Some(json!({"type": name})));
                }

                let mut value = decode_payload(payload)?;
                if let Some(object) = value.as_object_mut() {
                    object.insert("type".into(), json!(name));
                }
                return Ok(Some(value));
            }

            if let Some(payload) = line.strip_prefix("data:") {
                let payload = payload.trim();
                // OpenAI-style streams end with a bare "[DONE]" marker.
                if payload.is_empty() || payload.contains("DONE") {
                    continue;
                }
                return Ok(Some(decode_payload(payload)?));
            }

            // Blank separators, comments, anything else: skip.
        }
    }
}

fn decode_payload(payload: &str) -> Result<Value, Error> {
    serde_json::from_str(payload).map_err(|e| Error::ChunkDecode {
        message: format!("Anthropic: {e}"),
        raw: payload.to_string(),
    })
}
