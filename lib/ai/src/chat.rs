//! Chat session primitive.
//!
//! A multi-turn conversation over a bounded history, driving an injected
//! completion backend. Each query appends the caller's prompts, sends the
//! full retained history to the backend under a fixed deadline, and records
//! the reply. Failed turns are not rolled back: the attempted user prompts
//! stay in history.

use crate::backend::{COMPLETION_TIMEOUT, CompletionBackend, CompletionRequest};
use crate::config::AiConfig;
use crate::echo::{EchoSink, StderrEcho};
use crate::error::{ChatError, CompletionError};
use crate::openai::OpenAiBackend;
use colloquy_conversation::{BoundedHistory, Message};
use colloquy_core::SessionId;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A single conversation session.
///
/// Owned exclusively by one caller; mutating operations take `&mut self` and
/// concurrent queries must be serialized by the owner.
pub struct ChatSession {
    id: SessionId,
    backend: Arc<dyn CompletionBackend>,
    history: BoundedHistory,
    debug_echo: bool,
    echo: Box<dyn EchoSink>,
}

impl ChatSession {
    /// Creates a session over the given backend with the default message
    /// limit and a stderr echo sink.
    #[must_use]
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            id: SessionId::new(),
            backend,
            history: BoundedHistory::with_default_limit(),
            debug_echo: false,
            echo: Box::new(StderrEcho),
        }
    }

    /// Creates a session backed by an OpenAI-compatible service described
    /// by `config`.
    ///
    /// # Errors
    ///
    /// Fails when the configuration carries no credential.
    pub fn from_config(config: &AiConfig) -> colloquy_core::Result<Self, CompletionError> {
        let backend = OpenAiBackend::new(config)?;
        Ok(Self::new(Arc::new(backend)).with_message_limit(config.message_limit))
    }

    /// Replaces the history buffer with one bounded by `limit` messages.
    ///
    /// Intended at construction time; any accumulated history is discarded.
    #[must_use]
    pub fn with_message_limit(mut self, limit: usize) -> Self {
        self.history = BoundedHistory::new(limit);
        self
    }

    /// Replaces the diagnostic echo sink.
    #[must_use]
    pub fn with_echo_sink(mut self, sink: impl EchoSink + 'static) -> Self {
        self.echo = Box::new(sink);
        self
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the retained history in chronological order.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        self.history.messages()
    }

    /// Returns whether debug echo is enabled.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.debug_echo
    }

    /// Pins `content` as the session's system message, discarding any prior
    /// history.
    pub fn set_system(&mut self, content: impl Into<String>) {
        self.history.set_system(content);
    }

    /// Submits `prompts` as user messages, in order, and returns the
    /// assistant's reply with surrounding whitespace removed. The history
    /// keeps the reply verbatim.
    ///
    /// An empty prompt sequence still performs a round-trip on the
    /// unchanged history.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::UninitializedSession`] before any
    /// [`set_system`](Self::set_system), and surfaces backend failures
    /// unmodified. The appended user prompts are not rolled back on
    /// failure.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn query<I>(&mut self, prompts: I) -> Result<String, ChatError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if !self.history.is_initialized() {
            return Err(ChatError::UninitializedSession);
        }

        for prompt in prompts {
            self.history.push(Message::user(prompt));
        }

        if self.debug_echo {
            self.echo.echo(self.history.messages());
        }

        let request =
            CompletionRequest::new(self.backend.model(), self.history.messages().to_vec());

        let reply = match tokio::time::timeout(COMPLETION_TIMEOUT, self.backend.complete(&request))
            .await
        {
            Ok(result) => result?,
            Err(_) => return Err(CompletionError::Timeout.into()),
        };

        let text = match reply.first_text() {
            Some(text) => text.to_owned(),
            None => {
                return Err(CompletionError::ResponseParseFailed {
                    reason: "reply contained no candidates".to_string(),
                }
                .into());
            }
        };

        self.history.push(Message::assistant(text.clone()));
        debug!(
            chars = text.len(),
            history = self.history.len(),
            "assistant reply recorded"
        );

        Ok(text.trim().to_string())
    }

    /// Flips debug echo. When the new state is enabled, immediately echoes
    /// the current history. Returns the new state.
    pub fn toggle_debug(&mut self) -> bool {
        self.debug_echo = !self.debug_echo;
        if self.debug_echo {
            self.echo.echo(self.history.messages());
        }
        debug!(enabled = self.debug_echo, "debug echo toggled");
        self.debug_echo
    }

    /// Truncates the history back to just the pinned system message.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::UninitializedSession`] if no system message was
    /// ever set.
    pub fn reset(&mut self) -> Result<(), ChatError> {
        self.history.reset()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CompletionReply, ReplyCandidate, TokenUsage};
    use async_trait::async_trait;
    use colloquy_conversation::MessageRole;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double: pops scripted replies (falling back to "ok") and
    /// records every request it receives.
    #[derive(Default)]
    struct StubBackend {
        replies: Mutex<VecDeque<String>>,
        calls: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl StubBackend {
        fn with_replies<const N: usize>(replies: [&str; N]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests
                .lock()
                .expect("lock")
                .last()
                .expect("at least one request")
                .clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for StubBackend {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionReply, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().expect("lock").push(request.clone());
            let content = self
                .replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| "ok".to_string());
            Ok(CompletionReply {
                candidates: vec![ReplyCandidate { content }],
                usage: TokenUsage::default(),
                model: request.model.clone(),
            })
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionReply, CompletionError> {
            Err(CompletionError::RequestFailed {
                reason: "boom".to_string(),
            })
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    struct NeverBackend;

    #[async_trait]
    impl CompletionBackend for NeverBackend {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionReply, CompletionError> {
            std::future::pending::<()>().await;
            unreachable!("pending never completes")
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    struct EmptyBackend;

    #[async_trait]
    impl CompletionBackend for EmptyBackend {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionReply, CompletionError> {
            Ok(CompletionReply {
                candidates: Vec::new(),
                usage: TokenUsage::default(),
                model: "test-model".to_string(),
            })
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    /// Echo sink double: records the history length of every emission.
    #[derive(Clone, Default)]
    struct RecordingSink {
        emissions: Arc<Mutex<Vec<usize>>>,
    }

    impl RecordingSink {
        fn emissions(&self) -> Vec<usize> {
            self.emissions.lock().expect("lock").clone()
        }
    }

    impl EchoSink for RecordingSink {
        fn echo(&mut self, history: &[Message]) {
            self.emissions.lock().expect("lock").push(history.len());
        }
    }

    fn contents(session: &ChatSession) -> Vec<&str> {
        session
            .history()
            .iter()
            .map(|m| m.content.as_str())
            .collect()
    }

    fn roles(session: &ChatSession) -> Vec<MessageRole> {
        session.history().iter().map(|m| m.role).collect()
    }

    #[tokio::test]
    async fn round_trip_records_full_history() {
        let backend = StubBackend::with_replies(["Hi there"]);
        let mut session = ChatSession::new(backend.clone());
        session.set_system("You are helpful");

        let reply = session.query(["Hello"]).await.expect("success");

        assert_eq!(reply, "Hi there");
        assert_eq!(
            roles(&session),
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
        );
        assert_eq!(contents(&session), vec!["You are helpful", "Hello", "Hi there"]);
    }

    #[tokio::test]
    async fn reply_is_trimmed_on_return_but_stored_verbatim() {
        let backend = StubBackend::with_replies(["  Hi there\n"]);
        let mut session = ChatSession::new(backend);
        session.set_system("S");

        let reply = session.query(["Hello"]).await.expect("success");

        assert_eq!(reply, "Hi there");
        assert_eq!(session.history().last().expect("reply").content, "  Hi there\n");
    }

    #[tokio::test]
    async fn limit_three_retains_last_turn_only() {
        let backend = StubBackend::with_replies(["r1", "r2", "r3"]);
        let mut session = ChatSession::new(backend).with_message_limit(3);
        session.set_system("S");

        for prompt in ["q1", "q2", "q3"] {
            session.query([prompt]).await.expect("success");
        }

        assert_eq!(contents(&session), vec!["S", "q3", "r3"]);
    }

    #[tokio::test]
    async fn history_stays_bounded_across_many_queries() {
        let backend = Arc::new(StubBackend::default());
        let mut session = ChatSession::new(backend).with_message_limit(4);
        session.set_system("S");

        for i in 0..10 {
            session.query([format!("q{i}")]).await.expect("success");
            assert!(session.history().len() <= 4);
            assert_eq!(session.history()[0].content, "S");
        }
    }

    #[tokio::test]
    async fn full_history_is_sent_to_the_backend() {
        let backend = StubBackend::with_replies(["a1", "a2"]);
        let mut session = ChatSession::new(backend.clone());
        session.set_system("S");

        session.query(["q1"]).await.expect("success");
        session.query(["q2"]).await.expect("success");

        let sent = backend.last_request();
        assert_eq!(sent.model, "test-model");
        let sent_contents: Vec<&str> = sent.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(sent_contents, vec!["S", "q1", "a1", "q2"]);
    }

    #[tokio::test]
    async fn multiple_prompts_are_appended_in_order() {
        let backend = Arc::new(StubBackend::default());
        let mut session = ChatSession::new(backend.clone());
        session.set_system("S");

        session.query(["first", "second"]).await.expect("success");

        let sent_contents: Vec<String> = backend
            .last_request()
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(sent_contents, vec!["S", "first", "second"]);
    }

    #[tokio::test]
    async fn empty_prompts_still_round_trips() {
        let backend = StubBackend::with_replies(["ack"]);
        let mut session = ChatSession::new(backend.clone());
        session.set_system("S");

        let reply = session.query(Vec::<String>::new()).await.expect("success");

        assert_eq!(reply, "ack");
        assert_eq!(backend.calls(), 1);
        // The call went out on the unchanged history.
        assert_eq!(backend.last_request().messages.len(), 1);
        assert_eq!(contents(&session), vec!["S", "ack"]);
    }

    #[tokio::test]
    async fn failed_query_keeps_user_message() {
        let mut session = ChatSession::new(Arc::new(FailingBackend));
        session.set_system("S");

        let err = session.query(["Hello"]).await.expect_err("must fail");

        assert!(matches!(
            err,
            ChatError::Completion(CompletionError::RequestFailed { .. })
        ));
        assert_eq!(contents(&session), vec!["S", "Hello"]);
    }

    #[tokio::test]
    async fn contract_violating_empty_reply_is_an_error() {
        let mut session = ChatSession::new(Arc::new(EmptyBackend));
        session.set_system("S");

        let err = session.query(["Hello"]).await.expect_err("must fail");

        assert!(matches!(
            err,
            ChatError::Completion(CompletionError::ResponseParseFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_surfaces_as_timeout() {
        let mut session = ChatSession::new(Arc::new(NeverBackend));
        session.set_system("S");

        let err = session.query(["Hello"]).await.expect_err("must time out");

        assert_eq!(err, ChatError::Completion(CompletionError::Timeout));
        // The attempted turn stays in history.
        assert_eq!(contents(&session), vec!["S", "Hello"]);
    }

    #[tokio::test]
    async fn query_before_set_system_fails() {
        let mut session = ChatSession::new(Arc::new(StubBackend::default()));

        let err = session.query(["Hello"]).await.expect_err("uninitialized");

        assert_eq!(err, ChatError::UninitializedSession);
    }

    #[tokio::test]
    async fn set_system_discards_prior_turns() {
        let backend = Arc::new(StubBackend::default());
        let mut session = ChatSession::new(backend);
        session.set_system("first");
        session.query(["Hello"]).await.expect("success");

        session.set_system("second");

        assert_eq!(contents(&session), vec!["second"]);
    }

    #[tokio::test]
    async fn reset_restores_pinned_message() {
        let backend = Arc::new(StubBackend::default());
        let mut session = ChatSession::new(backend);
        session.set_system("S");
        session.query(["Hello"]).await.expect("success");

        session.reset().expect("initialized");

        assert_eq!(contents(&session), vec!["S"]);
    }

    #[test]
    fn reset_before_set_system_fails() {
        let mut session = ChatSession::new(Arc::new(StubBackend::default()));
        assert_eq!(session.reset(), Err(ChatError::UninitializedSession));
    }

    #[test]
    fn toggle_debug_emits_only_when_enabling() {
        let sink = RecordingSink::default();
        let mut session =
            ChatSession::new(Arc::new(StubBackend::default())).with_echo_sink(sink.clone());
        session.set_system("S");

        assert!(session.toggle_debug());
        assert!(session.debug_enabled());
        assert!(!session.toggle_debug());
        assert!(!session.debug_enabled());

        assert_eq!(sink.emissions().len(), 1);
    }

    #[tokio::test]
    async fn debug_echo_emits_on_every_query() {
        let sink = RecordingSink::default();
        let backend = Arc::new(StubBackend::default());
        let mut session = ChatSession::new(backend).with_echo_sink(sink.clone());
        session.set_system("S");

        session.toggle_debug();
        session.query(["Hello"]).await.expect("success");

        // One emission from the toggle ([system]), one from the query
        // ([system, user], echoed before the remote call).
        assert_eq!(sink.emissions(), vec![1, 2]);
    }

    #[tokio::test]
    async fn disabled_echo_stays_silent() {
        let sink = RecordingSink::default();
        let backend = Arc::new(StubBackend::default());
        let mut session = ChatSession::new(backend).with_echo_sink(sink.clone());
        session.set_system("S");

        session.query(["Hello"]).await.expect("success");

        assert!(sink.emissions().is_empty());
    }
}
