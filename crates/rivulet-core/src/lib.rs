//! Provider-neutral vocabulary for the rivulet LLM client.
//!
//! This crate defines the types shared by every provider adapter:
//! conversation [`Message`]s, [`ToolCall`]s and [`ToolResult`]s, the
//! downstream [`StreamChunk`] emitted while a response streams in, the
//! unified [`Error`] taxonomy, rate-limit records, and the [`ToolRegistry`]
//! that adapters consult when the model asks to invoke local tools.
//!
//! # Consuming a stream
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use rivulet_core::{ChunkKind, ChunkStream};
//!
//! async fn print_stream(mut stream: ChunkStream) {
//!     while let Some(chunk) = stream.next().await {
//!         match chunk {
//!             Ok(c) if c.kind == ChunkKind::Message => {
//!                 if let Some(text) = &c.text {
//!                     print!("{text}");
//!                 }
//!             }
//!             Ok(_) => {}
//!             Err(e) => eprintln!("stream error: {e}"),
//!         }
//!     }
//! }
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod error;
pub mod limits;
pub mod request;
pub mod stream;
pub mod tool;

pub use chat::{
    AdditionalContent, CitationKind, CitationPart, CitationRecord, FinishReason, Message,
    ToolCall, ToolResult,
};
pub use error::Error;
pub use limits::RateLimit;
pub use request::{ChatRequest, ThinkingOptions, ToolChoice};
pub use stream::{ChunkKind, ChunkMeta, ChunkStream, StreamChunk};
pub use tool::{tool_fn, JsonSchema, ToolDefinition, ToolError, ToolHandler, ToolRegistry};
