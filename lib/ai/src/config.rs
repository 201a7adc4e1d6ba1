//! Completion-service configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (prefix `COLLOQUY`, e.g. `COLLOQUY_API_KEY`).

use crate::error::CompletionError;
use colloquy_conversation::DEFAULT_MESSAGE_LIMIT;
use serde::Deserialize;

/// Configuration for the completion service and session defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Base address of the completion service.
    /// Absent or empty means the service's default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Access credential for the completion service. Required.
    pub api_key: String,

    /// Model identifier to query.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum number of retained messages, including the system message.
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_message_limit() -> usize {
    DEFAULT_MESSAGE_LIMIT
}

impl AiConfig {
    /// Creates a configuration with the given credential and defaults for
    /// everything else.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: None,
            api_key: api_key.into(),
            model: default_model(),
            message_limit: default_message_limit(),
        }
    }

    /// Sets the service base address.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the message limit.
    #[must_use]
    pub fn with_message_limit(mut self, limit: usize) -> Self {
        self.message_limit = limit;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> colloquy_core::Result<Self, CompletionError> {
        let loaded = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("COLLOQUY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CompletionError::InvalidConfig {
                reason: e.to_string(),
            })?;

        let parsed = loaded
            .try_deserialize()
            .map_err(|e| CompletionError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(parsed)
    }
}
