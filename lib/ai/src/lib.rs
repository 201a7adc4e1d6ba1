//! Completion-service integration for the colloquy library.
//!
//! This crate provides:
//!
//! - **Completion Backend**: Unified interface for chat-completion services
//! - **OpenAI Backend**: OpenAI-compatible HTTP implementation
//! - **Chat Session**: Bounded multi-turn conversation driving a backend
//!
//! Sessions own their conversation state exclusively; concurrent queries
//! against one session must be serialized by the caller.

pub mod backend;
pub mod chat;
pub mod config;
pub mod echo;
pub mod error;
pub mod openai;

pub use backend::{
    COMPLETION_TIMEOUT, CompletionBackend, CompletionReply, CompletionRequest, ReplyCandidate,
    TokenUsage,
};
pub use chat::ChatSession;
pub use config::AiConfig;
pub use echo::{EchoSink, StderrEcho};
pub use error::{ChatError, CompletionError};
pub use openai::OpenAiBackend;
