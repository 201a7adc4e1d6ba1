//! Conversation state for the colloquy library.
//!
//! This crate provides:
//!
//! - **Message**: Role-tagged, immutable conversation messages
//! - **Bounded History**: A fixed-size sliding window over messages with a
//!   pinned system message at position 0

pub mod error;
pub mod history;
pub mod message;

pub use error::HistoryError;
pub use history::{BoundedHistory, DEFAULT_MESSAGE_LIMIT};
pub use message::{Message, MessageRole};
