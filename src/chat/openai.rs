//! OpenAI-compatible chat-completion provider
//!
//! Implements ChatProvider by making HTTP calls to any OpenAI-compatible
//! API endpoint (OpenAI, Ollama, vLLM, LM Studio, etc.).

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::error::{Error, Result};

use super::{ChatMessage, ChatOptions, ChatProvider, Completion, TokenSink, TokenUsage};

// ─────────────────────────────────────────────────────────────────
// API types (request/response)
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// SSE line buffering
// ─────────────────────────────────────────────────────────────────

/// Reassembles SSE lines from raw network chunks.
///
/// Chunks are buffered as bytes and only complete lines are decoded,
/// so a multi-byte UTF-8 character split across chunk boundaries stays
/// intact. Trailing partial lines wait for the next chunk.
struct SseLineBuffer {
    buf: Vec<u8>,
}

impl SseLineBuffer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append a chunk and drain every complete line, trimmed.
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).trim().to_string());
        }
        lines
    }
}

// ─────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────

/// OpenAI-compatible HTTP provider.
pub struct OpenAiProvider {
    settings: ApiSettings,
    client: Client,
    /// Extra headers attached to every request (e.g. X-Spiral-Session).
    extra_headers: Vec<(String, String)>,
    total_requests: RwLock<u64>,
    total_tokens: RwLock<u64>,
}

impl OpenAiProvider {
    /// Create a new provider from API settings.
    pub fn new(settings: ApiSettings) -> Result<Self> {
        Self::with_headers(settings, Vec::new())
    }

    /// Create a new provider with extra per-request headers.
    pub fn with_headers(
        settings: ApiSettings,
        extra_headers: Vec<(String, String)>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!(
            base_url = %settings.base_url,
            model = %settings.model,
            "OpenAI-compatible provider created"
        );

        Ok(Self {
            settings,
            client,
            extra_headers,
            total_requests: RwLock::new(0),
            total_tokens: RwLock::new(0),
        })
    }

    /// Total completed requests over this provider's lifetime.
    pub fn total_requests(&self) -> u64 {
        *self.total_requests.read()
    }

    /// Total tokens reported by the API over this provider's lifetime.
    pub fn total_tokens(&self) -> u64 {
        *self.total_tokens.read()
    }

    /// Build the authorization header value (if API key is set)
    fn auth_header(&self) -> Option<String> {
        if self.settings.api_key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.settings.api_key))
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }

    fn build_request(&self, body: &impl Serialize) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.completions_url()).json(body);
        if let Some(auth) = self.auth_header() {
            req = req.header("Authorization", auth);
        }
        for (name, value) in &self.extra_headers {
            req = req.header(name.as_str(), value.as_str());
        }
        req
    }

    /// Send a request, retrying on transient failures with exponential backoff.
    async fn send_with_retry(&self, body: &impl Serialize) -> Result<reqwest::Response> {
        let mut last_error: Option<Error> = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(500 * 2u64.pow(attempt - 1));
                debug!(attempt, ?backoff, "Retrying after error");
                tokio::time::sleep(backoff).await;
            }

            match self.build_request(body).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = Error::ApiStatus {
                        status: status.as_u16(),
                        body: body_text,
                    };

                    if err.is_retryable() {
                        warn!(status = %status, attempt, "Retryable API error");
                        last_error = Some(err);
                    } else {
                        return Err(err);
                    }
                }
                Err(e) => {
                    if e.is_timeout() || e.is_connect() {
                        warn!(attempt, error = %e, "Retryable connection error");
                        last_error = Some(Error::api_request(e.to_string()));
                    } else {
                        return Err(Error::api_request(e.to_string()));
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::api_request("All retry attempts exhausted".to_string())))
    }

    fn record_usage(&self, usage: &Option<ApiUsage>) -> TokenUsage {
        *self.total_requests.write() += 1;
        if let Some(u) = usage {
            *self.total_tokens.write() += u.total_tokens as u64;
            TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }
        } else {
            TokenUsage::default()
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, messages: &[ChatMessage], opts: &ChatOptions) -> Result<Completion> {
        let body = ChatCompletionRequest {
            model: &opts.model,
            messages,
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
            stream: false,
        };

        let response = self.send_with_retry(&body).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::api_response(e.to_string()))?;

        let choice = parsed
            .choices
            .first()
            .ok_or_else(|| Error::api_response("No choices in API response"))?;

        let usage = self.record_usage(&parsed.usage);

        Ok(Completion {
            text: choice.message.content.clone().unwrap_or_default(),
            finish_reason: choice.finish_reason.clone(),
            usage,
        })
    }

    async fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        opts: &ChatOptions,
        sink: TokenSink<'_>,
    ) -> Result<Completion> {
        let body = ChatCompletionRequest {
            model: &opts.model,
            messages,
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
            stream: true,
        };

        let response = self.send_with_retry(&body).await?;

        let mut text = String::new();
        let mut finish_reason: Option<String> = None;
        let mut lines = SseLineBuffer::new();
        let mut stream = response.bytes_stream();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::api_request(e.to_string()))?;

            for line in lines.push(&chunk) {
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();

                if data == "[DONE]" {
                    break 'outer;
                }

                let parsed: ChatCompletionChunk =
                    serde_json::from_str(data).map_err(|e| Error::api_response(e.to_string()))?;

                if let Some(choice) = parsed.choices.first() {
                    if let Some(ref fragment) = choice.delta.content {
                        sink(fragment);
                        text.push_str(fragment);
                    }
                    if choice.finish_reason.is_some() {
                        finish_reason = choice.finish_reason.clone();
                    }
                }
            }
        }

        // Streaming responses do not report usage
        let usage = self.record_usage(&None);

        Ok(Completion {
            text,
            finish_reason,
            usage,
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
