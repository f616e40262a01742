//! Chat-completion client layer.
//!
//! `ChatProvider` is the seam between the CLI and the completion API.
//! The OpenAI-compatible HTTP provider is the real implementation; the
//! mock provider gives deterministic output for tests.

#[cfg(test)]
pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use openai::OpenAiProvider;

// ─────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a conversation, as stored in sessions and sent to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Request options / completion result
// ─────────────────────────────────────────────────────────────────

/// Per-request options for a completion call.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Model identifier (e.g. "gpt-4").
    pub model: String,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Completion token cap.
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Token usage reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Result of one completion call.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Full assistant response text.
    pub text: String,

    /// Finish reason as reported by the API ("stop", "length", ...).
    pub finish_reason: Option<String>,

    /// Token usage, zeroed when the API does not report it.
    pub usage: TokenUsage,
}

/// Callback invoked with each streamed text fragment.
pub type TokenSink<'a> = &'a mut (dyn FnMut(&str) + Send);

// ─────────────────────────────────────────────────────────────────
// Provider trait
// ─────────────────────────────────────────────────────────────────

/// A chat-completion provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Run one buffered completion over the full message list.
    async fn complete(&self, messages: &[ChatMessage], opts: &ChatOptions) -> Result<Completion>;

    /// Run one streaming completion, feeding text fragments to `sink` as
    /// they arrive. Returns the same `Completion` as the buffered call.
    async fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        opts: &ChatOptions,
        sink: TokenSink<'_>,
    ) -> Result<Completion>;
}
