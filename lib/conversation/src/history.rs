//! Bounded conversation history.
//!
//! A fixed-size sliding window over messages, anchored at position 0 by a
//! pinned system message. The window bound is an invariant maintained on
//! every append: eviction removes the oldest messages from just after the
//! pinned prefix, never the pinned message itself.

use crate::error::HistoryError;
use crate::message::Message;

/// Default maximum number of retained messages, including the pinned one.
pub const DEFAULT_MESSAGE_LIMIT: usize = 100;

/// An ordered message sequence bounded by a message-count limit.
///
/// The first message, once set via [`set_system`](Self::set_system), forms a
/// protected prefix that trimming never touches. All other messages are
/// evicted oldest-first when the limit is exceeded.
#[derive(Debug, Clone)]
pub struct BoundedHistory {
    messages: Vec<Message>,
    limit: usize,
    /// Protected prefix length: 0 until a system message is set, then 1.
    pinned: usize,
}

impl BoundedHistory {
    /// Creates an empty history bounded by `limit` messages.
    ///
    /// A limit of zero is treated as one; the pinned message always fits.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            // One extra slot: a push may briefly exceed the limit before trimming.
            messages: Vec::with_capacity(limit + 1),
            limit,
            pinned: 0,
        }
    }

    /// Creates an empty history with [`DEFAULT_MESSAGE_LIMIT`].
    #[must_use]
    pub fn with_default_limit() -> Self {
        Self::new(DEFAULT_MESSAGE_LIMIT)
    }

    /// Pins `content` as the system message, discarding any prior history.
    pub fn set_system(&mut self, content: impl Into<String>) {
        self.messages.clear();
        self.messages.push(Message::system(content));
        self.pinned = 1;
    }

    /// Appends a message at the end, evicting the oldest non-pinned
    /// messages if the limit would be exceeded.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.trim();
    }

    /// Applies the trim policy: retain the pinned prefix plus the most
    /// recent `limit - pinned` messages. No-op when within the limit.
    pub fn trim(&mut self) {
        if self.messages.len() <= self.limit {
            return;
        }
        let excess = self.messages.len() - self.limit;
        self.messages.drain(self.pinned..self.pinned + excess);
    }

    /// Truncates the history back to just the pinned system message.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Uninitialized`] if no system message was
    /// ever set.
    pub fn reset(&mut self) -> Result<(), HistoryError> {
        if self.pinned == 0 {
            return Err(HistoryError::Uninitialized);
        }
        self.messages.truncate(self.pinned);
        Ok(())
    }

    /// Returns the retained messages in chronological order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the pinned system message, if one was set.
    #[must_use]
    pub fn system(&self) -> Option<&Message> {
        (self.pinned > 0).then(|| &self.messages[0])
    }

    /// Returns true once a system message has been set.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.pinned > 0
    }

    /// Returns the number of retained messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if no messages are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the message-count limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for BoundedHistory {
    fn default() -> Self {
        Self::with_default_limit()
    }
}
