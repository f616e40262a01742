//! Mock chat provider for tests.
//!
//! Returns deterministic completions without any network I/O. Streaming
//! feeds the response to the sink word by word.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;

use super::{ChatMessage, ChatOptions, ChatProvider, Completion, Role, TokenSink, TokenUsage};

/// Deterministic in-process provider.
pub struct MockProvider {
    /// Canned response, or None to echo the last user message.
    response: Option<String>,
    call_count: RwLock<u64>,
}

impl MockProvider {
    /// Provider that echoes the last user message back.
    pub fn new() -> Self {
        Self {
            response: None,
            call_count: RwLock::new(0),
        }
    }

    /// Provider that always answers with `response`.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            call_count: RwLock::new(0),
        }
    }

    /// Number of completion calls made against this provider.
    pub fn call_count(&self) -> u64 {
        *self.call_count.read()
    }

    fn respond(&self, messages: &[ChatMessage]) -> String {
        *self.call_count.write() += 1;

        if let Some(ref canned) = self.response {
            return canned.clone();
        }

        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| format!("Echo: {}", m.content))
            .unwrap_or_else(|| "Echo: (no user message)".to_string())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, messages: &[ChatMessage], _opts: &ChatOptions) -> Result<Completion> {
        let text = self.respond(messages);
        Ok(Completion {
            text,
            finish_reason: Some("stop".to_string()),
            usage: TokenUsage::default(),
        })
    }

    async fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        _opts: &ChatOptions,
        sink: TokenSink<'_>,
    ) -> Result<Completion> {
        let text = self.respond(messages);

        let mut first = true;
        for word in text.split(' ') {
            if !first {
                sink(" ");
            }
            sink(word);
            first = false;
        }

        Ok(Completion {
            text,
            finish_reason: Some("stop".to_string()),
            usage: TokenUsage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_response() {
        let provider = MockProvider::new();
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("hello")];
        let completion =
            tokio_test::block_on(provider.complete(&messages, &ChatOptions::new("test"))).unwrap();
        assert_eq!(completion.text, "Echo: hello");
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_canned_response() {
        let provider = MockProvider::with_response("canned");
        let messages = vec![ChatMessage::user("anything")];
        let completion =
            tokio_test::block_on(provider.complete(&messages, &ChatOptions::new("test"))).unwrap();
        assert_eq!(completion.text, "canned");
    }

    #[test]
    fn test_streaming_matches_buffered() {
        let provider = MockProvider::with_response("one two three");
        let messages = vec![ChatMessage::user("go")];

        let mut streamed = String::new();
        let mut sink = |fragment: &str| streamed.push_str(fragment);
        let completion = tokio_test::block_on(provider.complete_streaming(
            &messages,
            &ChatOptions::new("test"),
            &mut sink,
        ))
        .unwrap();

        assert_eq!(completion.text, "one two three");
        assert_eq!(streamed, completion.text);
    }

    #[test]
    fn test_no_user_message() {
        let provider = MockProvider::new();
        let messages = vec![ChatMessage::system("only system")];
        let completion =
            tokio_test::block_on(provider.complete(&messages, &ChatOptions::new("test"))).unwrap();
        assert_eq!(completion.text, "Echo: (no user message)");
    }
}
