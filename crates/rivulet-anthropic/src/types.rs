//! Wire types for the Messages API.
//!
//! These mirror the provider's JSON shapes and are not part of the
//! public API. Request building happens in [`convert`](crate::convert);
//! streaming frames are decoded in the dispatcher from the tagged
//! values produced by [`sse`](crate::sse).

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Request types ──────────────────────────────────────────────────

/// Top-level request body for `POST /v1/messages`.
#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
    pub model: &'a str,
    pub messages: Vec<MessageParam>,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoiceParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingParam>,
}

/// A single message in the conversation.
#[derive(Debug, Serialize)]
pub(crate) struct MessageParam {
    pub role: &'static str,
    pub content: Vec<ContentBlock>,
}

/// A content block within a message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
        signature: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// Tool definition sent in the request.
#[derive(Debug, Serialize)]
pub(crate) struct Tool<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub input_schema: &'a Value,
}

/// Tool choice parameter.
#[derive(Debug, Serialize)]
pub(crate) struct ToolChoiceParam {
    #[serde(rename = "type")]
    pub choice_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Extended thinking configuration.
#[derive(Debug, Serialize)]
pub(crate) struct ThinkingParam {
    #[serde(rename = "type")]
    pub thinking_type: &'static str,
    pub budget_tokens: u32,
}

// ── Streaming frame types ──────────────────────────────────────────

/// One decoded SSE frame, after the frame parser has injected the
/// event name as `type`.
///
/// All fields are optional: each event type populates only its own
/// subset, and unknown shapes must not fail to decode.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EventFrame {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub message: Option<FrameMessage>,
    #[serde(default)]
    pub content_block: Option<FrameContentBlock>,
    #[serde(default)]
    pub delta: Option<FrameDelta>,
    /// Some provider versions put `stop_reason` directly on
    /// `message_stop`.
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Tolerated top-level text path for text deltas.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<FrameError>,
}

/// Message metadata from `message_start`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FrameMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Content block within a `content_block_start` event.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FrameContentBlock {
    #[serde(rename = "type", default)]
    pub block_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Delta content within `content_block_delta` and `message_delta`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FrameDelta {
    #[serde(rename = "type", default)]
    pub delta_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub text_delta: Option<FrameTextDelta>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub partial_json: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub citation: Option<Value>,
}

/// Nested text-delta path some gateways emit.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FrameTextDelta {
    #[serde(default)]
    pub text: Option<String>,
}

/// Payload of an in-stream `error` event.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FrameError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}
