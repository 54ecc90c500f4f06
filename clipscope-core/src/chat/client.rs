//! HTTP client for OpenAI-compatible chat completions
//!
//! Requests always set `stream: true`; the response body is decoded
//! incrementally into a [`ChatStream`].

use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;

use crate::config::ChatConfig;
use crate::error::{Error, Result};

use super::prompt::ChatMessage;
use super::stream::ChatStream;

/// Anything that can answer a chat with a fragment stream.
pub trait ChatBackend: Send + Sync {
    /// Start a completion for `messages`.
    ///
    /// Resolves once the response headers arrive; the body is read as the
    /// returned stream is polled.
    fn stream_chat(&self, messages: Vec<ChatMessage>) -> BoxFuture<'_, Result<ChatStream>>;
}

/// Request body for POST /chat/completions
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// HTTP client for a chat-completions endpoint
pub struct ChatClient {
    config: ChatConfig,
    http_client: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// Create a new chat client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ChatConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.endpoint.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let auth_value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
            );
        }

        // No total-request timeout: a streamed answer may outlive it. The
        // read timeout is idle time between chunks.
        let timeout = Duration::from_secs(config.timeout_secs);
        let http_client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            base_url,
        })
    }

    /// Model requests are sent to
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Full completions URL
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn start(&self, messages: Vec<ChatMessage>) -> Result<ChatStream> {
        let url = self.completions_url();
        let request_body = CompletionRequest {
            model: &self.config.model,
            messages: &messages,
            stream: true,
        };

        tracing::debug!(
            url = %url,
            model = %self.config.model,
            messages = messages.len(),
            "Starting chat completion"
        );

        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Chat(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            Ok(ChatStream::from_sse(response.bytes_stream()))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Chat(format!("API error ({}): {}", status, error_text)))
        }
    }
}

impl ChatBackend for ChatClient {
    fn stream_chat(&self, messages: Vec<ChatMessage>) -> BoxFuture<'_, Result<ChatStream>> {
        Box::pin(self.start(messages))
    }
}
