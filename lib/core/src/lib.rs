//! Core domain types and utilities for colloquy.
//!
//! This crate provides the foundational types and error handling used
//! throughout the colloquy conversational-session library.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{MessageId, SessionId};
