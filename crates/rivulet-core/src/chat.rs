//! Conversation messages, tool calls, and per-turn content.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized terminal status of a turn.
///
/// Providers report stop reasons in their own vocabulary; adapters map
/// them onto this fixed set before surfacing them to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    /// The model finished its turn normally (end of turn or a stop
    /// sequence was hit).
    Stop,
    /// The response was truncated by the max-token ceiling.
    Length,
    /// The model stopped to invoke one or more tools.
    ToolCalls,
    /// Any other, or absent, provider stop reason.
    Other,
}

/// A completed request from the model to invoke a local tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned identifier linking this call to its result.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Decoded argument object. Empty when the streamed argument JSON
    /// could not be parsed — the call is still surfaced.
    pub arguments: Map<String, Value>,
}

/// The outcome of invoking a local tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The `id` of the [`ToolCall`] this result answers.
    pub tool_call_id: String,
    /// Name of the tool that produced the result.
    pub name: String,
    /// The tool's string output.
    pub content: String,
}

/// Positional taxonomy of a citation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    /// The citation points at a page range of a source document.
    PageLocation,
    /// The citation points at a character range.
    CharLocation,
    /// The citation points at a content-block range.
    ContentBlockLocation,
}

/// A tagged positional reference to a source document.
///
/// The raw provider fields are preserved alongside the tag so callers
/// can read whichever positional fields the kind implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationRecord {
    /// Which positional signature the record carries.
    pub kind: CitationKind,
    /// The citation object exactly as the provider sent it.
    pub raw: Value,
}

/// A citation bound to the text delta it cites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationPart {
    /// The cited text.
    pub text: String,
    /// The positional record for the source being cited.
    pub citation: CitationRecord,
}

/// Reasoning text, signature, and citations attached to an assistant
/// turn or to an individual stream chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalContent {
    /// Accumulated reasoning ("thinking") text, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Provider signature over the reasoning text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_signature: Option<String>,
    /// Citations collected for the turn, in the order they were bound.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub citations: Vec<CitationPart>,
    /// Index into `citations` for the citation bound to this chunk's
    /// text delta, when the chunk carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_index: Option<usize>,
}

impl AdditionalContent {
    /// Returns `true` when no field carries content.
    pub fn is_empty(&self) -> bool {
        self.thinking.is_none()
            && self.thinking_signature.is_none()
            && self.citations.is_empty()
            && self.citation_index.is_none()
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// A system instruction. Merged into the provider's system prompt
    /// by the adapter rather than sent as a conversation turn.
    System {
        /// The instruction text.
        content: String,
    },
    /// A user turn.
    User {
        /// The user's text.
        content: String,
    },
    /// An assistant turn, possibly carrying tool calls and reasoning.
    Assistant {
        /// The assistant's visible text.
        content: String,
        /// Tool calls the assistant issued in this turn.
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        tool_calls: Vec<ToolCall>,
        /// Reasoning and citations attached to the turn.
        #[serde(skip_serializing_if = "AdditionalContent::is_empty", default)]
        additional: AdditionalContent,
    },
    /// The caller's reply to one or more tool calls.
    ToolResult {
        /// One result per answered tool call.
        results: Vec<ToolResult>,
    },
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a plain assistant message with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
            additional: AdditionalContent::default(),
        }
    }

    /// Creates a tool-result message.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::ToolResult { results }
    }
}
