//! Error types for the AI crate.
//!
//! - `CompletionError`: Failures from the completion backend
//! - `ChatError`: Failures from chat session operations
//!
//! Backend failures propagate to the caller unmodified; there is no local
//! recovery or retry, and no retryable/fatal distinction.

use colloquy_conversation::HistoryError;
use std::fmt;

/// Errors from completion backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// No access credential was provided at construction time.
    MissingCredential,
    /// Request failed (network, authentication, quota).
    RequestFailed { reason: String },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// Invalid configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => {
                write!(f, "no access credential configured for the completion service")
            }
            Self::RequestFailed { reason } => {
                write!(f, "completion request failed: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse completion response: {reason}")
            }
            Self::Timeout => write!(f, "completion request timed out"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid completion configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for CompletionError {}

/// Errors from chat session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The session has no system message set.
    UninitializedSession,
    /// The completion backend failed.
    Completion(CompletionError),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UninitializedSession => {
                write!(f, "session has no system message set")
            }
            Self::Completion(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UninitializedSession => None,
            Self::Completion(err) => Some(err),
        }
    }
}

impl From<CompletionError> for ChatError {
    fn from(err: CompletionError) -> Self {
        Self::Completion(err)
    }
}

impl From<HistoryError> for ChatError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Uninitialized => Self::UninitializedSession,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_display() {
        let err = CompletionError::RequestFailed {
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn timeout_display() {
        assert!(CompletionError::Timeout.to_string().contains("timed out"));
    }

    #[test]
    fn chat_error_wraps_completion_error() {
        let err: ChatError = CompletionError::Timeout.into();
        assert_eq!(err, ChatError::Completion(CompletionError::Timeout));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn uninitialized_history_maps_to_uninitialized_session() {
        let err: ChatError = HistoryError::Uninitialized.into();
        assert_eq!(err, ChatError::UninitializedSession);
    }
}
