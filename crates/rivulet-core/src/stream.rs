//! Downstream chunk types for streaming responses.
//!
//! An adapter turns the provider's event stream into a lazy sequence of
//! [`StreamChunk`]s. Text arrives as [`Message`](ChunkKind::Message)
//! chunks, reasoning as [`Thinking`](ChunkKind::Thinking) chunks, and
//! request metadata plus the terminal finish reason as
//! [`Meta`](ChunkKind::Meta) chunks. When a turn ends in tool use, one
//! chunk carries the finalized tool calls and a later chunk carries
//! their results before the next hop's chunks begin.
//!
//! Concatenating the `text` of Message-kind chunks across all hops
//! yields the assistant's full visible text; the terminal Meta chunk
//! repeats the accumulated text of its hop as a convenience and is not
//! part of that concatenation.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::chat::{AdditionalContent, FinishReason, ToolCall, ToolResult};
use crate::error::Error;
use crate::limits::RateLimit;

/// A pinned, boxed, `Send` stream of [`StreamChunk`] results.
///
/// Consume it with [`StreamExt`](futures::StreamExt) from the `futures`
/// crate. Errors arrive in-band; the stream ends after the terminal
/// chunk or the first error.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, Error>> + Send>>;

/// Which facet of the response a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkKind {
    /// Visible assistant output: text deltas, tool calls, tool results.
    Message,
    /// A reasoning-text delta.
    Thinking,
    /// Request metadata, and the terminal chunk of a conversation.
    Meta,
}

/// Request metadata attached to Meta chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Provider-assigned id of the current response message.
    pub request_id: String,
    /// The model that produced the response.
    pub model: String,
    /// Rate-limit snapshot taken from the current hop's response headers.
    pub rate_limits: Vec<RateLimit>,
}

/// One event surfaced to the consumer of a streaming conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Which facet of the response this chunk belongs to.
    pub kind: ChunkKind,
    /// A text delta (Message chunks), a reasoning delta (Thinking
    /// chunks), or the accumulated turn text (terminal Meta chunk).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set on the terminal chunk only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// The finalized tool calls of a turn that ended in tool use.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tool_calls: Vec<ToolCall>,
    /// Results of tools that have just executed locally.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tool_results: Vec<ToolResult>,
    /// Request metadata (Meta chunks).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ChunkMeta>,
    /// Reasoning and citation content attached to this chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional: Option<AdditionalContent>,
}

impl Default for StreamChunk {
    fn default() -> Self {
        Self {
            kind: ChunkKind::Message,
            text: None,
            finish_reason: None,
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            meta: None,
            additional: None,
        }
    }
}

impl StreamChunk {
    /// Creates a Message chunk carrying a text delta.
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            text: Some(delta.into()),
            ..Default::default()
        }
    }

    /// Creates a Thinking chunk carrying a reasoning delta.
    pub fn thinking(delta: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Thinking,
            text: Some(delta.into()),
            ..Default::default()
        }
    }

    /// Creates a Meta chunk carrying request metadata.
    pub fn meta(meta: ChunkMeta) -> Self {
        Self {
            kind: ChunkKind::Meta,
            meta: Some(meta),
            ..Default::default()
        }
    }

    /// Creates a Message chunk carrying finalized tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>, additional: Option<AdditionalContent>) -> Self {
        Self {
            tool_calls: calls,
            additional,
            ..Default::default()
        }
    }

    /// Creates a Message chunk carrying tool results.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            tool_results: results,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::Map;

    #[test]
    fn test_text_chunk() {
        let chunk = StreamChunk::text("hello");
        assert_eq!(chunk.kind, ChunkKind::Message);
        assert_eq!(chunk.text.as_deref(), Some("hello"));
        assert!(chunk.finish_reason.is_none());
        assert!(chunk.tool_calls.is_empty());
    }

    #[test]
    fn test_thinking_chunk() {
        let chunk = StreamChunk::thinking("let me see");
        assert_eq!(chunk.kind, ChunkKind::Thinking);
        assert_eq!(chunk.text.as_deref(), Some("let me see"));
    }

    #[test]
    fn test_meta_chunk() {
        let chunk = StreamChunk::meta(ChunkMeta {
            request_id: "msg_01".into(),
            model: "claude-sonnet-4-20250514".into(),
            rate_limits: vec![],
        });
        assert_eq!(chunk.kind, ChunkKind::Meta);
        assert_eq!(chunk.meta.unwrap().request_id, "msg_01");
    }

    #[test]
    fn test_tool_calls_chunk() {
        let chunk = StreamChunk::tool_calls(
            vec![ToolCall {
                id: "toolu_01".into(),
                name: "search".into(),
                arguments: Map::new(),
            }],
            None,
        );
        assert_eq!(chunk.kind, ChunkKind::Message);
        assert_eq!(chunk.tool_calls.len(), 1);
        assert!(chunk.tool_results.is_empty());
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let json = serde_json::to_value(StreamChunk::text("hi")).unwrap();
        assert!(json.get("finish_reason").is_none());
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("meta").is_none());
    }

    #[tokio::test]
    async fn test_chunk_stream_collect() {
        let chunks = vec![
            Ok(StreamChunk::text("hello ")),
            Ok(StreamChunk::text("world")),
        ];
        let stream: ChunkStream = Box::pin(futures::stream::iter(chunks));
        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 2);
        assert!(collected.iter().all(Result::is_ok));
    }

    #[test]
    fn test_chunk_stream_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ChunkStream>();
    }
}
