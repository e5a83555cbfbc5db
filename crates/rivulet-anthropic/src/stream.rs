//! The streaming state machine and tool driver.
//!
//! One conversation is a sequence of hops. Each hop opens a streaming
//! request, dispatches SSE frames into per-hop [`StreamState`], and
//! yields [`StreamChunk`]s downstream. When a turn ends in tool use the
//! driver finalizes the accumulated calls, runs them through the
//! registry, appends the assistant and tool-result turns to the
//! conversation, and opens the next hop — until a turn ends without
//! tool use or the `max_steps` bound is hit.
//!
//! The whole pipeline is a single `futures::stream::unfold` over a
//! phase enum, so the consumer pulls: reading the body, invoking tools,
//! and opening the next request all happen inside its `next().await`.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, warn};

use rivulet_core::chat::{AdditionalContent, CitationPart, Message, ToolCall, ToolResult};
use rivulet_core::error::Error;
use rivulet_core::limits::RateLimit;
use rivulet_core::request::ChatRequest;
use rivulet_core::stream::{ChunkKind, ChunkMeta, ChunkStream, StreamChunk};
use rivulet_core::tool::{ToolError, ToolRegistry};

use crate::config::AnthropicConfig;
use crate::convert::{build_request, classify_status, map_finish_reason};
use crate::provider::{default_headers, messages_url};
use crate::sse::{ByteSource, FrameReader};
use crate::state::{decode_citation, BlockKind, StreamState};
use crate::types::{EventFrame, FrameDelta};

/// Runs the full multi-hop conversation as a lazy chunk stream.
pub(crate) fn process_stream(
    client: reqwest::Client,
    config: AnthropicConfig,
    request: ChatRequest,
    registry: Arc<ToolRegistry>,
) -> ChunkStream {
    let driver = StreamDriver {
        client,
        config,
        request,
        registry,
        depth: 0,
        state: StreamState::default(),
        rate_limits: Vec::new(),
    };

    let stream = futures::stream::unfold(
        (driver, Phase::Open),
        |(mut driver, phase)| async move {
            let mut phase = phase;
            loop {
                match phase {
                    Phase::Done => return None,
                    Phase::Open => match driver.open_hop().await {
                        Step::Yield(item, next) => return Some((item, (driver, next))),
                        Step::Continue(next) => phase = next,
                    },
                    Phase::Streaming(frames) => match driver.pump(frames).await {
                        Step::Yield(item, next) => return Some((item, (driver, next))),
                        Step::Continue(next) => phase = next,
                    },
                    Phase::ToolHandoff => match driver.tool_handoff() {
                        Step::Yield(item, next) => return Some((item, (driver, next))),
                        Step::Continue(next) => phase = next,
                    },
                    Phase::ExecutingTools(calls) => match driver.execute_tools(calls) {
                        Step::Yield(item, next) => return Some((item, (driver, next))),
                        Step::Continue(next) => phase = next,
                    },
                }
            }
        },
    );
    Box::pin(stream)
}

/// Where the driver is within the current hop.
enum Phase {
    /// About to open a streaming request (depth is checked here).
    Open,
    /// Pulling SSE frames from an open response body.
    Streaming(FrameReader),
    /// A turn ended in tool use; surface the finalized calls.
    ToolHandoff,
    /// Run the surfaced calls and append the exchange to history.
    ExecutingTools(Vec<ToolCall>),
    /// Terminal.
    Done,
}

/// Result of processing one phase step.
enum Step {
    /// Yield an item downstream and transition.
    Yield(Result<StreamChunk, Error>, Phase),
    /// Transition without yielding.
    Continue(Phase),
}

struct StreamDriver {
    client: reqwest::Client,
    config: AnthropicConfig,
    request: ChatRequest,
    registry: Arc<ToolRegistry>,
    /// Completed tool-call round trips so far. Strictly monotonic,
    /// bounded by `request.max_steps`.
    depth: u32,
    state: StreamState,
    /// Snapshot from the current hop's response headers.
    rate_limits: Vec<RateLimit>,
}

impl StreamDriver {
    /// Opens the next streaming hop, enforcing the depth bound before
    /// any request is sent.
    async fn open_hop(&mut self) -> Step {
        if self.depth >= self.request.max_steps {
            return Step::Yield(
                Err(Error::MaxStepsExceeded {
                    limit: self.request.max_steps,
                }),
                Phase::Done,
            );
        }

        debug!(depth = self.depth, "opening streaming request");
        let response = match self.send().await {
            Ok(response) => response,
            Err(e) => return Step::Yield(Err(e), Phase::Done),
        };

        let (rate_limits, _) = crate::limits::parse_rate_limit_headers(response.headers());
        self.rate_limits = rate_limits;
        self.state = StreamState::default();

        let model = self.config.model.clone();
        let source: ByteSource = Box::pin(response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| Error::ProviderRequest {
                model: model.clone(),
                status: None,
                message: format!("stream read error: {e}"),
            })
        }));
        Step::Continue(Phase::Streaming(FrameReader::new(source)))
    }

    /// Sends the request for the current conversation and validates the
    /// HTTP status.
    async fn send(&self) -> Result<reqwest::Response, Error> {
        let payload = build_request(&self.request, &self.config)?;
        let headers = default_headers(&self.config)?;

        let mut builder = self
            .client
            .post(messages_url(&self.config))
            .headers(headers)
            .json(&payload);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| Error::ProviderRequest {
            model: self.config.model.clone(),
            status: e
                .status()
                .and_then(|s| http::StatusCode::from_u16(s.as_u16()).ok()),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let status = http::StatusCode::from_u16(status.as_u16())
                .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &headers, &self.config.model, &body));
        }

        Ok(response)
    }

    /// Pulls the next frame from the open response body.
    async fn pump(&mut self, mut frames: FrameReader) -> Step {
        match frames.next_frame().await {
            Ok(Some(value)) => self.dispatch(value, frames),
            Ok(None) => {
                // Truncated stream: if the model already declared tool
                // calls, drive them rather than dropping the turn.
                if self.state.has_tool_calls() {
                    warn!("stream ended without message_stop; driving accumulated tool calls");
                    Step::Continue(Phase::ToolHandoff)
                } else {
                    Step::Continue(Phase::Done)
                }
            }
            Err(e) => Step::Yield(Err(e), Phase::Done),
        }
    }

    /// Interprets one decoded frame, mutating per-hop state and
    /// deciding what to emit.
    fn dispatch(&mut self, value: Value, frames: FrameReader) -> Step {
        let Ok(frame) = serde_json::from_value::<EventFrame>(value) else {
            return Step::Continue(Phase::Streaming(frames));
        };

        match frame.event_type.as_str() {
            "message_start" => {
                if let Some(message) = frame.message {
                    if let Some(id) = message.id {
                        self.state.request_id = id;
                    }
                    if let Some(model) = message.model {
                        self.state.model = model;
                    }
                }
                Step::Yield(
                    Ok(StreamChunk::meta(self.chunk_meta())),
                    Phase::Streaming(frames),
                )
            }
            "content_block_start" => {
                self.state.block_index = frame.index;
                if let Some(block) = frame.content_block {
                    match block.block_type.as_str() {
                        "text" => self.state.block_kind = Some(BlockKind::Text),
                        "tool_use" => {
                            self.state.block_kind = Some(BlockKind::ToolUse);
                            self.state.start_tool_call(
                                frame.index.unwrap_or_default(),
                                block.id.unwrap_or_default(),
                                block.name.unwrap_or_default(),
                            );
                        }
                        "thinking" => {
                            self.state.block_kind = Some(BlockKind::Thinking);
                            self.state.thinking.clear();
                            self.state.thinking_signature.clear();
                        }
                        _ => self.state.block_kind = None,
                    }
                }
                Step::Continue(Phase::Streaming(frames))
            }
            "content_block_delta" => self.on_delta(frame, frames),
            "content_block_stop" => {
                self.state.block_kind = None;
                self.state.block_index = None;
                // A citation that never saw its text delta is dropped.
                self.state.pending_citation = None;
                Step::Continue(Phase::Streaming(frames))
            }
            "message_delta" => {
                if let Some(reason) = frame.delta.and_then(|d| d.stop_reason) {
                    self.state.stop_reason = Some(reason);
                }
                if self.turn_ended_in_tool_use() {
                    Step::Continue(Phase::ToolHandoff)
                } else {
                    Step::Continue(Phase::Streaming(frames))
                }
            }
            "message_stop" => {
                let reason = frame
                    .stop_reason
                    .or_else(|| frame.delta.and_then(|d| d.stop_reason));
                if let Some(reason) = reason {
                    self.state.stop_reason = Some(reason);
                }
                if self.turn_ended_in_tool_use() {
                    Step::Continue(Phase::ToolHandoff)
                } else {
                    Step::Yield(Ok(self.final_chunk()), Phase::Done)
                }
            }
            "error" => {
                let err = match frame.error {
                    Some(e) if e.error_type == "overloaded_error" => Error::Overloaded,
                    Some(e) => Error::ProviderResponse {
                        message: format!("{} {}", e.error_type, e.message),
                    },
                    None => Error::ProviderResponse {
                        message: "unknown provider error".into(),
                    },
                };
                Step::Yield(Err(err), Phase::Done)
            }
            // Pings and unrecognized event types carry nothing we need.
            _ => Step::Continue(Phase::Streaming(frames)),
        }
    }

    /// Handles one `content_block_delta` frame.
    fn on_delta(&mut self, frame: EventFrame, frames: FrameReader) -> Step {
        let index = frame.index.or(self.state.block_index);
        let top_level_text = frame.text;
        let Some(delta) = frame.delta else {
            return Step::Continue(Phase::Streaming(frames));
        };

        let FrameDelta {
            delta_type,
            text,
            text_delta,
            thinking,
            signature,
            partial_json,
            citation,
            ..
        } = delta;

        // Deltas normally self-identify; fall back to the open block's
        // kind when the tag is missing.
        let delta_type = delta_type.as_deref().or(match self.state.block_kind {
            Some(BlockKind::Text) => Some("text_delta"),
            Some(BlockKind::ToolUse) => Some("input_json_delta"),
            Some(BlockKind::Thinking) => Some("thinking_delta"),
            None => None,
        });

        match delta_type {
            Some("text_delta") => {
                let text = text
                    .or(text_delta.and_then(|t| t.text))
                    .or(top_level_text)
                    .unwrap_or_default();
                if text.is_empty() {
                    return Step::Continue(Phase::Streaming(frames));
                }
                self.state.text.push_str(&text);

                let additional = self.state.pending_citation.take().map(|citation| {
                    self.state.citations.push(CitationPart {
                        text: text.clone(),
                        citation,
                    });
                    AdditionalContent {
                        citation_index: Some(self.state.citations.len() - 1),
                        ..Default::default()
                    }
                });

                let chunk = StreamChunk {
                    text: Some(text),
                    additional,
                    ..Default::default()
                };
                Step::Yield(Ok(chunk), Phase::Streaming(frames))
            }
            Some("input_json_delta") => {
                if let (Some(index), Some(partial)) = (index, partial_json) {
                    if let Some(slot) = self.state.slot_mut(index) {
                        slot.partial_input.push_str(&partial);
                    }
                }
                Step::Continue(Phase::Streaming(frames))
            }
            Some("thinking_delta") => {
                let Some(thinking) = thinking.filter(|t| !t.is_empty()) else {
                    return Step::Continue(Phase::Streaming(frames));
                };
                self.state.thinking.push_str(&thinking);
                Step::Yield(
                    Ok(StreamChunk::thinking(thinking)),
                    Phase::Streaming(frames),
                )
            }
            Some("signature_delta") => {
                if let Some(signature) = signature {
                    self.state.thinking_signature.push_str(&signature);
                }
                Step::Continue(Phase::Streaming(frames))
            }
            Some("citations_delta") => {
                let Some(raw) = citation else {
                    return Step::Continue(Phase::Streaming(frames));
                };
                match decode_citation(&raw) {
                    Ok(record) => {
                        self.state.pending_citation = Some(record);
                        Step::Continue(Phase::Streaming(frames))
                    }
                    Err(e) => Step::Yield(Err(e), Phase::Done),
                }
            }
            _ => Step::Continue(Phase::Streaming(frames)),
        }
    }

    fn turn_ended_in_tool_use(&self) -> bool {
        self.state.stop_reason.as_deref() == Some("tool_use") && self.state.has_tool_calls()
    }

    /// Surfaces the finalized tool calls of the current turn.
    fn tool_handoff(&mut self) -> Step {
        let calls = self.state.finalize_tool_calls();
        debug!(count = calls.len(), "model requested tool calls");
        let chunk = StreamChunk::tool_calls(calls.clone(), self.state.additional_content());
        Step::Yield(Ok(chunk), Phase::ExecutingTools(calls))
    }

    /// Runs the surfaced calls sequentially, appends the assistant and
    /// tool-result turns to the conversation, and moves to the next hop.
    fn execute_tools(&mut self, calls: Vec<ToolCall>) -> Step {
        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            let Some(handler) = self.registry.get(&call.name) else {
                return Step::Yield(
                    Err(Error::ToolExecution {
                        tool_name: call.name.clone(),
                        source: Box::new(ToolError::new(format!(
                            "tool '{}' is not registered",
                            call.name
                        ))),
                    }),
                    Phase::Done,
                );
            };
            debug!(tool = %call.name, id = %call.id, "invoking tool");
            match handler.invoke(&call.arguments) {
                Ok(output) => results.push(ToolResult {
                    tool_call_id: call.id.clone(),
                    name: call.name.clone(),
                    content: output,
                }),
                Err(e) => {
                    return Step::Yield(
                        Err(Error::ToolExecution {
                            tool_name: call.name.clone(),
                            source: Box::new(e),
                        }),
                        Phase::Done,
                    )
                }
            }
        }

        let additional = self.state.additional_content().unwrap_or_default();
        self.request.messages.push(Message::Assistant {
            content: std::mem::take(&mut self.state.text),
            tool_calls: calls,
            additional,
        });
        self.request
            .messages
            .push(Message::tool_results(results.clone()));
        self.depth += 1;

        Step::Yield(
            Ok(StreamChunk::tool_results(results)),
            Phase::Open,
        )
    }

    fn chunk_meta(&self) -> ChunkMeta {
        ChunkMeta {
            request_id: self.state.request_id.clone(),
            model: self.state.model.clone(),
            rate_limits: self.rate_limits.clone(),
        }
    }

    /// The terminal chunk: accumulated text, mapped finish reason,
    /// metadata, and the turn's additional content.
    fn final_chunk(&self) -> StreamChunk {
        StreamChunk {
            kind: ChunkKind::Meta,
            text: Some(self.state.text.clone()),
            finish_reason: Some(map_finish_reason(
                self.state.stop_reason.as_deref().unwrap_or_default(),
            )),
            meta: Some(self.chunk_meta()),
            additional: self.state.additional_content(),
            ..Default::default()
        }
    }
}
