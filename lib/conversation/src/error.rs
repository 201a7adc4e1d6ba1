//! Error types for the conversation crate.

use std::fmt;

/// Errors from history operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    /// The history has no pinned system message.
    Uninitialized,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "history has no system message"),
        }
    }
}

impl std::error::Error for HistoryError {}
