//! OpenAI-compatible completion backend.
//!
//! Speaks the `POST /v1/chat/completions` wire protocol over HTTPS with
//! bearer-token authentication, which many hosted and local services accept.

use crate::backend::{
    COMPLETION_TIMEOUT, CompletionBackend, CompletionReply, CompletionRequest, ReplyCandidate,
    TokenUsage,
};
use crate::config::AiConfig;
use crate::error::CompletionError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Completion backend for OpenAI-compatible chat-completion APIs.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiBackend {
    /// Creates a backend from configuration.
    ///
    /// An absent or empty base address selects the service default; a custom
    /// base gets the `/v1` API prefix appended.
    ///
    /// # Errors
    ///
    /// Fails with [`CompletionError::MissingCredential`] when no credential
    /// is configured. No instance is produced.
    pub fn new(config: &AiConfig) -> Result<Self, Report<CompletionError>> {
        if config.api_key.is_empty() {
            return Err(CompletionError::MissingCredential.into());
        }

        let base = match config.base_url.as_deref() {
            Some(base) if !base.is_empty() => base.trim_end_matches('/'),
            _ => DEFAULT_BASE_URL,
        };
        let endpoint = format!("{base}/v1/chat/completions");

        let client = reqwest::Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()
            .map_err(|e| CompletionError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint,
        })
    }

    /// Returns the endpoint this backend posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireReplyMessage,
}

#[derive(Deserialize)]
struct WireReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionReply, CompletionError> {
        let body = WireRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout
                } else {
                    CompletionError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CompletionError::RequestFailed {
                reason: format!("{status}: {detail}"),
            });
        }

        let parsed: WireResponse =
            response
                .json()
                .await
                .map_err(|e| CompletionError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        if parsed.choices.is_empty() {
            return Err(CompletionError::ResponseParseFailed {
                reason: "reply contained no candidates".to_string(),
            });
        }

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        debug!(candidates = parsed.choices.len(), "completion received");

        Ok(CompletionReply {
            candidates: parsed
                .choices
                .into_iter()
                .map(|c| ReplyCandidate {
                    content: c.message.content,
                })
                .collect(),
            usage,
            model: request.model.clone(),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
