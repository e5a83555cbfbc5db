//! Request payload building and HTTP error classification.
//!
//! This module is internal — callers interact only with `rivulet-core`
//! types. The stream driver uses these functions to serialize the
//! running conversation and to map provider error responses into the
//! public taxonomy.

use reqwest::header::HeaderMap;
use serde_json::Value;

use rivulet_core::chat::{FinishReason, Message};
use rivulet_core::error::Error;
use rivulet_core::request::{ChatRequest, ToolChoice};

use crate::config::AnthropicConfig;
use crate::limits::parse_rate_limit_headers;
use crate::types::{ContentBlock, MessageParam, Request, ThinkingParam, Tool, ToolChoiceParam};

/// Token budget used when thinking is enabled without an explicit one.
const DEFAULT_THINKING_BUDGET: u32 = 1024;

/// Build a Messages API request body from the running conversation.
///
/// System-role messages are merged with `request.system` into the
/// top-level `system` param and filtered from `messages`. Null or
/// empty optional fields are dropped from the serialized body.
pub(crate) fn build_request<'a>(
    request: &'a ChatRequest,
    config: &'a AnthropicConfig,
) -> Result<Request<'a>, Error> {
    let system = merge_system(request);
    let messages = convert_messages(&request.messages);

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(
            request
                .tools
                .iter()
                .map(|t| Tool {
                    name: &t.name,
                    description: &t.description,
                    input_schema: t.parameters.as_value(),
                })
                .collect(),
        )
    };

    let tool_choice = request.tool_choice.as_ref().map(convert_tool_choice);

    let thinking = match &request.thinking {
        Some(options) if options.enabled => {
            let budget_tokens = options.budget_tokens.unwrap_or(DEFAULT_THINKING_BUDGET);
            if budget_tokens == 0 {
                return Err(Error::InvalidRequest(
                    "thinking budget_tokens must be a positive integer".into(),
                ));
            }
            Some(ThinkingParam {
                thinking_type: "enabled",
                budget_tokens,
            })
        }
        _ => None,
    };

    Ok(Request {
        model: &config.model,
        messages,
        max_tokens: request.max_tokens.unwrap_or(config.max_tokens),
        stream: true,
        system,
        temperature: request.temperature,
        top_p: request.top_p,
        tools,
        tool_choice,
        thinking,
    })
}

/// Merge `request.system` with any system-role messages, joined by
/// blank lines. Returns `None` when there is nothing to send.
fn merge_system(request: &ChatRequest) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(system) = request.system.as_deref() {
        if !system.is_empty() {
            parts.push(system);
        }
    }
    for message in &request.messages {
        if let Message::System { content } = message {
            if !content.is_empty() {
                parts.push(content);
            }
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// Render conversation turns as wire messages.
///
/// System messages are handled via the top-level `system` param and
/// filtered out here. Tool-result turns become `user` messages of
/// `tool_result` blocks.
fn convert_messages(messages: &[Message]) -> Vec<MessageParam> {
    messages
        .iter()
        .filter_map(|message| match message {
            Message::System { .. } => None,
            Message::User { content } => Some(MessageParam {
                role: "user",
                content: vec![ContentBlock::Text {
                    text: content.clone(),
                }],
            }),
            Message::Assistant {
                content,
                tool_calls,
                additional,
            } => {
                let mut blocks = Vec::new();
                // A signed thinking block must precede the visible text
                // when replaying an assistant turn.
                if let (Some(thinking), Some(signature)) = (
                    additional.thinking.as_ref(),
                    additional.thinking_signature.as_ref(),
                ) {
                    blocks.push(ContentBlock::Thinking {
                        thinking: thinking.clone(),
                        signature: signature.clone(),
                    });
                }
                if !content.is_empty() {
                    blocks.push(ContentBlock::Text {
                        text: content.clone(),
                    });
                }
                for call in tool_calls {
                    blocks.push(ContentBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: Value::Object(call.arguments.clone()),
                    });
                }
                Some(MessageParam {
                    role: "assistant",
                    content: blocks,
                })
            }
            Message::ToolResult { results } => Some(MessageParam {
                role: "user",
                content: results
                    .iter()
                    .map(|r| ContentBlock::ToolResult {
                        tool_use_id: r.tool_call_id.clone(),
                        content: r.content.clone(),
                    })
                    .collect(),
            }),
        })
        .collect()
}

/// Map a tool-choice constraint to the wire parameter.
fn convert_tool_choice(choice: &ToolChoice) -> ToolChoiceParam {
    match choice {
        ToolChoice::Auto => ToolChoiceParam {
            choice_type: "auto",
            name: None,
        },
        ToolChoice::None => ToolChoiceParam {
            choice_type: "none",
            name: None,
        },
        ToolChoice::Required => ToolChoiceParam {
            choice_type: "any",
            name: None,
        },
        ToolChoice::Specific(name) => ToolChoiceParam {
            choice_type: "tool",
            name: Some(name.clone()),
        },
    }
}

/// Map a provider stop reason onto the normalized set.
pub(crate) fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        _ => FinishReason::Other,
    }
}

/// Classify a non-success HTTP response into the public taxonomy.
pub(crate) fn classify_status(
    status: http::StatusCode,
    headers: &HeaderMap,
    model: &str,
    body: &str,
) -> Error {
    match status.as_u16() {
        429 => {
            let (rate_limits, retry_after) = parse_rate_limit_headers(headers);
            Error::RateLimited {
                rate_limits,
                retry_after,
            }
        }
        529 => Error::Overloaded,
        413 => Error::RequestTooLarge,
        _ => Error::ProviderRequest {
            model: model.into(),
            status: Some(status),
            message: body.into(),
        },
    }
}
