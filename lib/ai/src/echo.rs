//! Diagnostic echo sink.
//!
//! When a session's debug echo is enabled, the full in-memory history is
//! written to a developer-visible sink on every query and on every
//! toggle-to-enabled transition. Unstructured and process-local; distinct
//! from the `tracing` instrumentation.

use colloquy_conversation::Message;
use std::io::Write;

/// Sink for diagnostic history echoes.
pub trait EchoSink: Send {
    /// Emits the current history.
    fn echo(&mut self, history: &[Message]);
}

/// Echo sink writing to standard error.
#[derive(Debug, Default)]
pub struct StderrEcho;

impl EchoSink for StderrEcho {
    fn echo(&mut self, history: &[Message]) {
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        let _ = writeln!(out, "--- history ({} messages)", history.len());
        for message in history {
            let _ = writeln!(out, "[{}] {}", message.role, message.content);
        }
    }
}
