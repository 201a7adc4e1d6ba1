//! Completion backend abstraction.
//!
//! Provides a unified interface for chat-completion services. Backends are
//! injected into sessions at construction time, never held as process-wide
//! singletons, so tests can substitute doubles.

use crate::error::CompletionError;
use async_trait::async_trait;
use colloquy_conversation::Message;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bound on a single completion round-trip, measured from call start.
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// A request to a completion service.
///
/// Carries the full retained history, never a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// The message history to complete, in chronological order.
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
        }
    }
}

/// A single generated reply candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyCandidate {
    /// The generated assistant text.
    pub content: String,
}

/// Token usage statistics reported by the service.
///
/// Informational only; history trimming stays message-count based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// A reply from a completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReply {
    /// Generated candidates; the contract guarantees at least one.
    pub candidates: Vec<ReplyCandidate>,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Model that generated the reply.
    pub model: String,
}

impl CompletionReply {
    /// Returns the first candidate's text, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.candidates.first().map(|c| c.content.as_str())
    }
}

/// Trait for completion backends.
///
/// The single capability the conversation layer depends on: given a message
/// history, produce a generated reply.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends the history to the service and returns its reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion call fails.
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionReply, CompletionError>;

    /// Returns the model identifier this backend queries.
    fn model(&self) -> &str;
}
