//! Anthropic Messages API adapter for rivulet.
//!
//! This crate streams conversations against an Anthropic-style
//! `POST /v1/messages` endpoint: it parses the server-sent-event
//! response incrementally, surfaces text, reasoning, and citation
//! deltas as [`StreamChunk`](rivulet_core::StreamChunk)s, and drives
//! local tools when the model asks for them — appending the assistant
//! and tool-result turns to the conversation and re-opening a new
//! streaming request, up to the request's `max_steps` bound.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use rivulet_anthropic::{AnthropicConfig, AnthropicProvider};
//! use rivulet_core::{ChatRequest, ChunkKind, Message, ToolRegistry};
//!
//! # async fn example() {
//! let provider = AnthropicProvider::new(AnthropicConfig {
//!     api_key: std::env::var("ANTHROPIC_API_KEY").unwrap(),
//!     ..Default::default()
//! });
//!
//! let request = ChatRequest {
//!     messages: vec![Message::user("Hello!")],
//!     ..Default::default()
//! };
//!
//! let mut stream = provider.stream(request, Arc::new(ToolRegistry::new()));
//! while let Some(chunk) = stream.next().await {
//!     match chunk {
//!         Ok(c) if c.kind == ChunkKind::Message => {
//!             if let Some(text) = &c.text {
//!                 print!("{text}");
//!             }
//!         }
//!         Ok(_) => {}
//!         Err(e) => eprintln!("stream error: {e}"),
//!     }
//! }
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod convert;
mod limits;
mod provider;
mod sse;
mod state;
mod stream;
mod types;

pub use config::AnthropicConfig;
pub use provider::AnthropicProvider;
