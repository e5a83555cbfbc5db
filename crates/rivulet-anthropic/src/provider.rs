//! The public adapter entry point.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::instrument;

use rivulet_core::error::Error;
use rivulet_core::request::ChatRequest;
use rivulet_core::stream::ChunkStream;
use rivulet_core::tool::ToolRegistry;

use crate::config::AnthropicConfig;
use crate::stream::process_stream;

/// Streaming client for the Anthropic Messages API.
///
/// One provider owns one HTTP client and one configuration; it may
/// serve any number of concurrent streams, each with its own
/// per-invocation state.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new provider from configuration.
    ///
    /// If `config.client` is `Some`, that client is reused for
    /// connection pooling. Otherwise a new client is built with the
    /// configured timeout.
    pub fn new(config: AnthropicConfig) -> Self {
        let client = config.client.clone().unwrap_or_else(|| {
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = config.timeout {
                builder = builder.timeout(timeout);
            }
            builder.build().expect("failed to build HTTP client")
        });
        Self { config, client }
    }

    /// Streams a conversation, driving registered tools through as many
    /// hops as the model requests, bounded by `request.max_steps`.
    ///
    /// The returned stream is lazy: nothing is sent until the first
    /// `next().await`, and all errors — including failures of the
    /// initial request — arrive in-band.
    #[instrument(skip_all, fields(model = %self.config.model, max_steps = request.max_steps))]
    pub fn stream(&self, request: ChatRequest, registry: Arc<ToolRegistry>) -> ChunkStream {
        process_stream(
            self.client.clone(),
            self.config.clone(),
            request,
            registry,
        )
    }
}

/// Build the default headers for Messages API requests.
pub(crate) fn default_headers(config: &AnthropicConfig) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-api-key",
        HeaderValue::from_str(&config.api_key).map_err(|_| {
            Error::InvalidRequest("API key contains invalid header characters".into())
        })?,
    );
    headers.insert(
        "anthropic-version",
        HeaderValue::from_str(&config.api_version).map_err(|_| {
            Error::InvalidRequest("API version contains invalid header characters".into())
        })?,
    );
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Build the full URL for the messages endpoint.
pub(crate) fn messages_url(config: &AnthropicConfig) -> String {
    let base = config.base_url.trim_end_matches('/');
    format!("{base}/v1/messages")
}
