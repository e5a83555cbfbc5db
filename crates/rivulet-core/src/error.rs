//! Unified error type for all provider operations.
//!
//! Adapters map provider HTTP responses and in-stream error events into
//! [`Error`], giving callers a single type to match against. Variants
//! carry enough context for retry layers (rate-limit records, retry-after
//! hints) without the core performing any retries itself.

use serde_json::Value;

use crate::limits::RateLimit;

/// The unified error type surfaced through the chunk stream.
///
/// Variants are `#[non_exhaustive]` — new kinds may be added in minor
/// releases without breaking downstream matches (always include a
/// wildcard arm).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The provider returned HTTP 429.
    ///
    /// Carries the parsed rate-limit records and the `retry-after`
    /// header in seconds, for consumption by a caller-side retry layer.
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited {
        /// One record per rate-limited resource.
        rate_limits: Vec<RateLimit>,
        /// Seconds to wait before retrying, when the provider said so.
        retry_after: Option<u64>,
    },

    /// The provider returned HTTP 529 or an in-stream `overloaded_error`.
    #[error("provider overloaded")]
    Overloaded,

    /// The request payload exceeded the provider's size limit (HTTP 413).
    #[error("request payload too large")]
    RequestTooLarge,

    /// A non-empty `data:` line in the event stream was not valid JSON.
    #[error("failed to decode stream chunk: {message}")]
    ChunkDecode {
        /// What went wrong during parsing.
        message: String,
        /// The raw payload line, for diagnostics.
        raw: String,
    },

    /// A transport-level failure, or an HTTP error status not mapped to
    /// a more specific variant.
    ///
    /// `status` is `None` when the request never received a response
    /// (connection failure, timeout at the transport layer).
    #[error("request to {model} failed (status={status:?}): {message}")]
    ProviderRequest {
        /// The model the request targeted.
        model: String,
        /// The HTTP status code, if one was received.
        status: Option<http::StatusCode>,
        /// A human-readable description of the failure.
        message: String,
    },

    /// The provider sent an in-stream `error` event of a type other
    /// than `overloaded_error`.
    #[error("provider error: {message}")]
    ProviderResponse {
        /// The provider's error type and message, concatenated.
        message: String,
    },

    /// The tool-call chain reached the configured step bound.
    #[error("maximum tool call chain depth exceeded (limit: {limit})")]
    MaxStepsExceeded {
        /// The configured maximum number of streaming hops.
        limit: u32,
    },

    /// A streamed citation record carried none of the recognized
    /// positional signatures.
    #[error("citation record has no recognized location signature: {raw}")]
    InvalidCitation {
        /// The citation object exactly as the provider sent it.
        raw: Value,
    },

    /// The request was malformed before it was sent (invalid header
    /// values, non-positive thinking budget).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A tool invocation failed, or the model named a tool that is not
    /// registered.
    #[error("tool execution error ({tool_name}): {source}")]
    ToolExecution {
        /// The name of the tool that failed.
        tool_name: String,
        /// The underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Returns `true` if the error is transient and the request may
    /// succeed on retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rivulet_core::Error;
    ///
    /// assert!(Error::Overloaded.is_retryable());
    /// assert!(!Error::RequestTooLarge.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Overloaded => true,
            // No status means the request never got a response.
            Self::ProviderRequest { status, .. } => {
                status.map_or(true, |s| s.is_server_error())
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ChunkDecode {
            message: err.to_string(),
            raw: String::new(),
        }
    }
}
