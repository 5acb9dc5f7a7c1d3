//! Mock implementations for testing
//!
//! These mocks drive a full session without a real endpoint or display.

use super::{SessionHandle, SessionRuntime, SessionSnapshot};
use crate::client::{ChatClient, ChatReply, ChatRequest, ClientError};
use crate::config::SessionConfig;
use crate::display::{MemorySurface, SurfaceState};
use crate::state_machine::{Notice, TurnOutcome};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Mock Chat Client
// ============================================================================

/// Mock chat client that returns queued replies
#[derive(Default)]
pub struct MockChatClient {
    responses: Mutex<VecDeque<Result<ChatReply, ClientError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.responses.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_error(&self, error: ClientError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self) -> Result<ChatReply, ClientError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::transport("No mock response queued")))
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next()
    }
}

// ============================================================================
// Delayed Mock Chat Client
// ============================================================================

/// Mock chat client that holds each request for a fixed delay
pub struct DelayedMockChatClient {
    inner: MockChatClient,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockChatClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockChatClient::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: ChatReply) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ChatClient for DelayedMockChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        // notify_one keeps a permit if nobody is waiting yet
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next()
    }
}

/// Client whose request future panics
pub struct PanickingChatClient;

#[async_trait]
impl ChatClient for PanickingChatClient {
    async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, ClientError> {
        panic!("chat client exploded");
    }
}

// ============================================================================
// Test Session
// ============================================================================

/// A running session plus handles to observe it
pub struct TestSession {
    pub handle: SessionHandle,
    pub surface: MemorySurface,
    pub notices: broadcast::Receiver<Notice>,
    pub runtime: tokio::task::JoinHandle<()>,
}

impl TestSession {
    pub fn start<C: ChatClient + 'static>(client: C) -> Self {
        Self::with_config(client, &SessionConfig::default())
    }

    pub fn with_config<C: ChatClient + 'static>(client: C, config: &SessionConfig) -> Self {
        let surface = MemorySurface::new();
        let (runtime, handle) = SessionRuntime::new(config, client, surface.clone());
        let notices = handle.subscribe();
        let runtime = tokio::spawn(runtime.run());
        Self {
            handle,
            surface,
            notices,
            runtime,
        }
    }

    /// Wait for the next finished turn and return how it ended
    pub async fn wait_for_finish(&mut self, timeout: Duration) -> Option<TurnOutcome> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.notices.recv()).await {
                Ok(Ok(Notice::TurnFinished { outcome })) => return Some(outcome),
                _ => continue,
            }
        }
        None
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot().await.unwrap()
    }

    pub fn display(&self) -> SurfaceState {
        self.surface.snapshot()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientErrorKind;
    use crate::history::HistorySource;
    use crate::input::SubmitAffordance;
    use crate::message::{HistoryEntry, Sender};
    use crate::state_machine::{TurnState, APOLOGY_TEXT, ERROR_INTENT, RESET_NOTICE};

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_mock_chat_client() {
        let client = MockChatClient::new();
        client.queue_reply(ChatReply::text("one"));

        let request = ChatRequest {
            message: "hi".to_string(),
            history: vec![],
        };
        assert_eq!(client.send(&request).await.unwrap().response, "one");
        let err = client.send(&request).await.unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Transport);
        assert_eq!(client.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_session_starts_with_welcome() {
        let session = TestSession::start(MockChatClient::new());

        let snap = session.snapshot().await;
        assert_eq!(snap.state, TurnState::Idle);
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.messages[0].sender(), Sender::Bot);
        assert!(snap.input.enabled);

        let display = session.display();
        assert_eq!(display.entries.len(), 1);
        assert_eq!(display.input.as_ref().map(|v| v.enabled), Some(true));
    }

    #[tokio::test]
    async fn test_successful_turn() {
        let client = Arc::new(MockChatClient::new());
        client.queue_reply(ChatReply::text("Hi!").with_intent("greeting"));

        let mut session = TestSession::start(client.clone());
        session.handle.submit("Hello").await.unwrap();

        assert_eq!(
            session.wait_for_finish(WAIT).await,
            Some(TurnOutcome::Resolved)
        );

        let snap = session.snapshot().await;
        assert!(snap.state.is_idle());
        assert_eq!(snap.messages.len(), 3);
        assert_eq!(snap.messages[1].sender(), Sender::User);
        assert_eq!(snap.messages[1].text(), "Hello");
        assert_eq!(snap.messages[2].sender(), Sender::Bot);
        assert_eq!(snap.messages[2].text(), "Hi!");
        assert_eq!(snap.messages[2].intent(), Some("greeting"));
        assert!(snap.input.enabled);
        assert!(snap.input.focused);

        // History carries the welcome plus the message being sent
        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "Hello");
        assert_eq!(
            requests[0].history,
            vec![
                HistoryEntry::new(Sender::Bot, SessionConfig::default().welcome_text),
                HistoryEntry::new(Sender::User, "Hello"),
            ]
        );

        let display = session.display();
        assert_eq!(display.entries.len(), 3);
        assert!(!display.typing);
        let debug = display.entries[2].full_text();
        assert!(debug.contains("Intent: greeting"), "got {debug}");
    }

    #[tokio::test]
    async fn test_whitespace_submission_is_ignored() {
        let client = Arc::new(MockChatClient::new());
        let session = TestSession::start(client.clone());

        session.handle.submit("   ").await.unwrap();

        let snap = session.snapshot().await;
        assert!(snap.state.is_idle());
        assert_eq!(snap.messages.len(), 1);
        assert!(snap.input.enabled);
        assert!(client.recorded_requests().is_empty());
        assert_eq!(session.display().entries.len(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_becomes_apology() {
        let client = Arc::new(MockChatClient::new());
        client.queue_error(ClientError::remote(500, "Internal Server Error"));

        let mut session = TestSession::start(client);
        session.handle.submit("Where is the library?").await.unwrap();

        assert_eq!(
            session.wait_for_finish(WAIT).await,
            Some(TurnOutcome::Failed {
                kind: ClientErrorKind::Remote { status: 500 }
            })
        );

        let snap = session.snapshot().await;
        assert!(snap.state.is_idle());
        assert_eq!(snap.messages.len(), 3);
        let apology = &snap.messages[2];
        assert_eq!(apology.sender(), Sender::Bot);
        assert_eq!(apology.text(), APOLOGY_TEXT);
        assert_eq!(apology.intent(), Some(ERROR_INTENT));
        assert_eq!(apology.entities(), None);
        assert!(snap.input.enabled);
        assert_eq!(snap.input.affordance, SubmitAffordance::Send);
        assert!(!session.display().typing);
    }

    #[tokio::test]
    async fn test_markup_reply_and_history_sources() {
        let reply = "**Library hours**\n* Mon-Fri 8-6";

        for (source, expected_bot_history) in [
            (HistorySource::Transcript, reply.to_string()),
            (HistorySource::Rendered, "Library hours• Mon-Fri 8-6".to_string()),
        ] {
            let client = Arc::new(MockChatClient::new());
            client.queue_reply(ChatReply::text(reply));
            client.queue_reply(ChatReply::text("You're welcome"));

            let config = SessionConfig {
                history_source: source,
                ..SessionConfig::default()
            };
            let mut session = TestSession::with_config(client.clone(), &config);

            session.handle.submit("Library hours?").await.unwrap();
            assert!(session.wait_for_finish(WAIT).await.is_some());

            let display = session.display();
            let content = &display.entries[2].primary_block().unwrap().markup;
            assert!(
                content.contains("<strong>Library hours</strong><br>• Mon-Fri 8-6"),
                "got {content}"
            );

            session.handle.submit("Thanks").await.unwrap();
            assert!(session.wait_for_finish(WAIT).await.is_some());

            let requests = client.recorded_requests();
            assert_eq!(requests.len(), 2);
            let history = &requests[1].history;
            assert_eq!(history.len(), 4, "source {source}");
            assert_eq!(history[2].sender, Sender::Bot);
            assert_eq!(history[2].text, expected_bot_history, "source {source}");
            assert_eq!(history[3], HistoryEntry::new(Sender::User, "Thanks"));
        }
    }

    #[tokio::test]
    async fn test_submit_while_awaiting_is_rejected() {
        let client = Arc::new(DelayedMockChatClient::new(Duration::from_millis(200)));
        client.queue_reply(ChatReply::text("first answer"));
        let started = client.request_started.clone();

        let mut session = TestSession::start(client.clone());
        session.handle.submit("first").await.unwrap();
        tokio::time::timeout(WAIT, started.notified())
            .await
            .expect("request should start");

        let snap = session.snapshot().await;
        assert_eq!(snap.state.name(), "awaiting");
        assert!(!snap.input.enabled);
        assert_eq!(snap.input.affordance, SubmitAffordance::Loading);
        assert!(session.display().typing);

        session.handle.submit("second").await.unwrap();
        session.handle.reset().await.unwrap();

        assert_eq!(
            session.wait_for_finish(WAIT).await,
            Some(TurnOutcome::Resolved)
        );

        let snap = session.snapshot().await;
        let texts: Vec<_> = snap.messages.iter().map(|m| m.text().to_string()).collect();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[1], "first");
        assert_eq!(texts[2], "first answer");
        assert_eq!(client.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_edits_ignored_while_input_disabled() {
        let client = Arc::new(DelayedMockChatClient::new(Duration::from_millis(200)));
        client.queue_reply(ChatReply::text("ok"));
        let started = client.request_started.clone();

        let mut session = TestSession::start(client);
        session.handle.submit("first").await.unwrap();
        tokio::time::timeout(WAIT, started.notified())
            .await
            .expect("request should start");

        session.handle.input_changed("typed too early").await.unwrap();
        let snap = session.snapshot().await;
        assert!(!snap.input.enabled);
        assert_eq!(snap.input.text, "");

        assert!(session.wait_for_finish(WAIT).await.is_some());
        session.handle.input_changed("next question").await.unwrap();
        assert_eq!(session.snapshot().await.input.text, "next question");
    }

    #[tokio::test]
    async fn test_focus_input_command() {
        let session = TestSession::start(MockChatClient::new());
        assert!(!session.snapshot().await.input.focused);

        session.handle.focus_input().await.unwrap();

        assert!(session.snapshot().await.input.focused);
        let display = session.display();
        assert_eq!(display.input.map(|v| v.focused), Some(true));
    }

    #[tokio::test]
    async fn test_request_timeout_becomes_apology() {
        let client = DelayedMockChatClient::new(Duration::from_secs(5));
        client.queue_reply(ChatReply::text("too late"));

        let config = SessionConfig {
            request_timeout: Some(Duration::from_millis(50)),
            ..SessionConfig::default()
        };
        let mut session = TestSession::with_config(client, &config);
        session.handle.submit("Hello?").await.unwrap();

        assert_eq!(
            session.wait_for_finish(WAIT).await,
            Some(TurnOutcome::Failed {
                kind: ClientErrorKind::Timeout
            })
        );
        let snap = session.snapshot().await;
        assert_eq!(snap.messages[2].text(), APOLOGY_TEXT);
        assert!(snap.input.enabled);
    }

    #[tokio::test]
    async fn test_panicking_client_still_resolves_turn() {
        let mut session = TestSession::start(PanickingChatClient);
        session.handle.submit("Hello").await.unwrap();

        assert_eq!(
            session.wait_for_finish(WAIT).await,
            Some(TurnOutcome::Failed {
                kind: ClientErrorKind::Transport
            })
        );
        let snap = session.snapshot().await;
        assert!(snap.state.is_idle());
        assert_eq!(snap.messages[2].intent(), Some(ERROR_INTENT));
        assert!(snap.input.enabled);
    }

    #[tokio::test]
    async fn test_reset_keeps_welcome_and_adds_notice() {
        let client = Arc::new(MockChatClient::new());
        client.queue_reply(ChatReply::text("Hi!"));

        let mut session = TestSession::start(client);
        session.handle.submit("Hello").await.unwrap();
        assert!(session.wait_for_finish(WAIT).await.is_some());

        session.handle.reset().await.unwrap();

        let snap = session.snapshot().await;
        assert_eq!(snap.messages.len(), 2);
        assert_eq!(snap.messages[0].text(), SessionConfig::default().welcome_text);
        assert_eq!(snap.messages[1].sender(), Sender::System);
        assert_eq!(snap.messages[1].text(), RESET_NOTICE);

        let display = session.display();
        assert_eq!(display.entries.len(), 2);
        assert_eq!(display.entries[1].role, "system");

        let mut saw_reset = false;
        while let Ok(notice) = session.notices.try_recv() {
            saw_reset |= notice == Notice::SessionReset;
        }
        assert!(saw_reset);
    }

    #[tokio::test]
    async fn test_submit_input_uses_buffer() {
        let client = Arc::new(MockChatClient::new());
        client.queue_reply(ChatReply::text("It's in building C"));

        let mut session = TestSession::start(client.clone());
        session
            .handle
            .input_changed("Where is the library?\n")
            .await
            .unwrap();
        assert_eq!(session.snapshot().await.input.height_px, 62);

        session.handle.submit_input().await.unwrap();
        assert!(session.wait_for_finish(WAIT).await.is_some());

        let snap = session.snapshot().await;
        assert_eq!(snap.messages[1].text(), "Where is the library?");
        assert_eq!(snap.input.text, "");
        assert_eq!(snap.input.height_px, 38);
        assert_eq!(client.recorded_requests()[0].message, "Where is the library?");
    }

    #[tokio::test]
    async fn test_turns_append_in_order() {
        let client = Arc::new(MockChatClient::new());
        client.queue_reply(ChatReply::text("a1"));
        client.queue_error(ClientError::malformed("bad json"));
        client.queue_reply(ChatReply::text("a3"));

        let mut session = TestSession::start(client);
        for question in ["q1", "q2", "q3"] {
            session.handle.submit(question).await.unwrap();
            assert!(session.wait_for_finish(WAIT).await.is_some());
        }

        let snap = session.snapshot().await;
        let texts: Vec<_> = snap.messages[1..].iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["q1", "a1", "q2", APOLOGY_TEXT, "q3", "a3"]);
    }

    #[tokio::test]
    async fn test_runtime_stops_when_handles_dropped() {
        let TestSession {
            handle, runtime, ..
        } = TestSession::start(MockChatClient::new());
        drop(handle);

        tokio::time::timeout(WAIT, runtime)
            .await
            .expect("runtime should stop")
            .unwrap();
    }
}
