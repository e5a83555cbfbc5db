//! Caller-facing request parameters.

use serde::{Deserialize, Serialize};

use crate::chat::Message;
use crate::tool::ToolDefinition;

/// How the model should choose among the offered tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolChoice {
    /// The model decides whether to call a tool.
    Auto,
    /// The model must not call any tool.
    None,
    /// The model must call at least one tool.
    Required,
    /// The model must call the named tool.
    Specific(String),
}

/// Extended-thinking options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingOptions {
    /// Whether to request reasoning output at all.
    pub enabled: bool,
    /// Token budget for reasoning. Defaults to 1024 when `None`; must
    /// be positive when set.
    pub budget_tokens: Option<u32>,
}

impl ThinkingOptions {
    /// Enables thinking with the default budget.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            budget_tokens: None,
        }
    }

    /// Enables thinking with an explicit budget.
    pub fn with_budget(budget_tokens: u32) -> Self {
        Self {
            enabled: true,
            budget_tokens: Some(budget_tokens),
        }
    }
}

/// Parameters for one streaming conversation.
///
/// Use struct update syntax with [`Default`]:
///
/// ```rust
/// use rivulet_core::{ChatRequest, Message};
///
/// let request = ChatRequest {
///     messages: vec![Message::user("What time is the game?")],
///     max_steps: 3,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    /// The conversation so far. The adapter appends assistant and
    /// tool-result turns here between streaming hops.
    pub messages: Vec<Message>,
    /// System prompt. Merged with any system-role entries in
    /// `messages`.
    pub system: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus-sampling cutoff.
    pub top_p: Option<f32>,
    /// Response token ceiling. Falls back to the adapter's configured
    /// default when `None`.
    pub max_tokens: Option<u32>,
    /// Tool schemas offered to the model.
    pub tools: Vec<ToolDefinition>,
    /// Tool-choice constraint.
    pub tool_choice: Option<ToolChoice>,
    /// Maximum number of streaming hops, counting the first. The
    /// default of 1 allows no tool-call round trips.
    pub max_steps: u32,
    /// Extended-thinking options.
    pub thinking: Option<ThinkingOptions>,
}

impl ChatRequest {
    /// Creates a request with the given messages and defaults otherwise.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            system: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            tools: Vec::new(),
            tool_choice: None,
            // One hop: the model answers directly, no tool round trips.
            max_steps: 1,
            thinking: None,
        }
    }
}
