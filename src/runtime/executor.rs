//! Session runtime executor

use super::{Command, SessionHandle, SessionSnapshot};
use crate::client::{ChatClient, ChatReply, ChatRequest, ClientError};
use crate::config::SessionConfig;
use crate::display::DisplaySurface;
use crate::history::{self, HistorySource};
use crate::input::{InputController, InputView};
use crate::message::{Message, MessageDraft};
use crate::render::MessageRenderer;
use crate::state_machine::{transition, Effect, Event, Notice, TurnState};
use crate::transcript::TranscriptStore;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Runtime that owns one session's transcript, input and display, and
/// executes the effects of the turn state machine.
pub struct SessionRuntime<C, D>
where
    C: ChatClient + 'static,
    D: DisplaySurface + 'static,
{
    state: TurnState,
    transcript: TranscriptStore,
    renderer: MessageRenderer,
    input: InputController,
    display: D,
    client: Arc<C>,
    history_source: HistorySource,
    request_timeout: Option<Duration>,
    command_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<Event>,
    event_rx: mpsc::Receiver<Event>,
    notice_tx: broadcast::Sender<Notice>,
}

impl<C, D> SessionRuntime<C, D>
where
    C: ChatClient + 'static,
    D: DisplaySurface + 'static,
{
    /// Create a session showing only the welcome message
    pub fn new(config: &SessionConfig, client: C, mut display: D) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (notice_tx, _) = broadcast::channel(128);

        let renderer = MessageRenderer::new(config.render);
        let welcome = Message::from_draft(MessageDraft::bot(config.welcome_text.as_str()));
        display.append(renderer.render(&welcome));
        display.scroll_to_latest();

        let input = InputController::new(config.input);
        display.update_input(&input.view());

        let runtime = Self {
            state: TurnState::Idle,
            transcript: TranscriptStore::new(welcome),
            renderer,
            input,
            display,
            client: Arc::new(client),
            history_source: config.history_source,
            request_timeout: config.request_timeout,
            command_rx,
            event_tx,
            event_rx,
            notice_tx: notice_tx.clone(),
        };
        let handle = SessionHandle {
            command_tx,
            notice_tx,
        };
        (runtime, handle)
    }

    /// Process commands and request results until every handle is dropped
    pub async fn run(mut self) {
        tracing::info!(history_source = %self.history_source, "Starting chat session runtime");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command);
                }
                Some(event) = self.event_rx.recv() => {
                    self.process_event(event);
                }
            }
        }

        if let Some(turn) = self.state.turn() {
            // No cancellation: the background request finishes into a closed channel
            tracing::info!(pending = %turn.pending_text, "Abandoning in-flight request");
        }
        tracing::info!("Chat session runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { text } => self.process_event(Event::Submit { text }),
            Command::SubmitInput => {
                let text = self.input.view().text;
                self.process_event(Event::Submit { text });
            }
            Command::InputChanged { text } => {
                if !self.input.is_enabled() {
                    tracing::debug!(state = self.state.name(), "Ignoring edit to disabled input");
                    return;
                }
                let view = self.input.set_text(text);
                self.display.update_input(&view);
            }
            Command::Reset => self.process_event(Event::ResetRequested),
            Command::FocusInput => {
                let view = self.input.focus();
                self.display.update_input(&view);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            messages: self.transcript.all().to_vec(),
            input: self.input.view(),
        }
    }

    fn process_event(&mut self, event: Event) {
        // Effects may generate follow-up events; run them to completion
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();

            let result = match transition(&self.state, current_event) {
                Ok(r) => r,
                Err(e) if e.is_guard_rejection() => {
                    tracing::debug!(state = self.state.name(), reason = %e, "Ignoring command");
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping event");
                    return;
                }
            };

            tracing::debug!(
                event = event_name,
                from = self.state.name(),
                to = result.new_state.name(),
                "Turn transition"
            );
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect) {
                    events_to_process.push(generated_event);
                }
            }
        }
    }

    /// Execute an effect and optionally return a generated event
    fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::SetInputEnabled { enabled } => {
                let view = self.input.set_enabled(enabled);
                self.update_input(&view);
                None
            }

            Effect::AppendMessage { draft } => {
                let message = Message::from_draft(draft);
                let rendered = self.renderer.render(&message);
                tracing::debug!(
                    id = %message.id(),
                    sender = %message.sender(),
                    "Appending message"
                );
                self.transcript.append(message);
                self.display.append(rendered);
                self.display.scroll_to_latest();
                None
            }

            Effect::ClearInput => {
                let view = self.input.clear();
                self.update_input(&view);
                None
            }

            Effect::ComposeHistory => {
                let history = match self.history_source {
                    HistorySource::Transcript => history::from_transcript(self.transcript.all()),
                    HistorySource::Rendered => history::from_rendered(&self.display.rendered()),
                };
                Some(Event::HistoryReady { history })
            }

            Effect::ShowTyping => {
                self.display.show_typing();
                self.display.scroll_to_latest();
                None
            }

            Effect::HideTyping => {
                self.display.hide_typing();
                None
            }

            Effect::SendRequest { request } => {
                self.spawn_request(request);
                // The reply arrives later as an event from the spawned task
                None
            }

            Effect::FinishTurn => Some(Event::TurnFinished),

            Effect::FocusInput => {
                let view = self.input.focus();
                self.update_input(&view);
                None
            }

            Effect::ResetTranscript => {
                self.transcript.reset();
                self.display.clear_to_welcome();
                self.display.scroll_to_latest();
                None
            }

            Effect::Notify { notice } => {
                // No subscribers is fine
                let _ = self.notice_tx.send(notice);
                None
            }
        }
    }

    fn update_input(&mut self, view: &InputView) {
        self.display.update_input(view);
    }

    fn spawn_request(&self, request: ChatRequest) {
        let client = self.client.clone();
        let event_tx = self.event_tx.clone();
        let timeout = self.request_timeout;

        tokio::spawn(async move {
            tracing::info!(
                history_len = request.history.len(),
                "Sending chat request (background)"
            );

            let event = match send_with_timeout(client.as_ref(), &request, timeout).await {
                Ok(reply) => Event::ReplyReceived { reply },
                Err(error) => {
                    tracing::warn!(kind = error.kind.as_str(), error = %error, "Turn failed");
                    Event::RequestFailed { error }
                }
            };
            let _ = event_tx.send(event).await;
        });
    }
}

/// Send one request, bounded by `timeout`. A panicking client counts as a
/// transport failure so the turn still resolves.
async fn send_with_timeout<C>(
    client: &C,
    request: &ChatRequest,
    timeout: Option<Duration>,
) -> Result<ChatReply, ClientError>
where
    C: ChatClient + ?Sized,
{
    let call = AssertUnwindSafe(client.send(request)).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(ClientError::timeout(format!("No reply within {limit:?}"))),
        },
        None => call.await,
    };
    outcome.unwrap_or_else(|_| Err(ClientError::transport("Chat client panicked")))
}
