//! Runtime for one chat session
//!
//! The caller constructs a [`SessionRuntime`], spawns [`SessionRuntime::run`],
//! and drives it through the returned [`SessionHandle`]. There is no global
//! session; each runtime owns its transcript, input and display.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::input::InputView;
use crate::message::Message;
use crate::state_machine::{Notice, TurnState};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Typed commands accepted by a session
#[derive(Debug)]
pub enum Command {
    /// Submit the given text as a new turn
    Submit { text: String },
    /// Submit whatever is currently in the input buffer
    SubmitInput,
    /// The user edited the input buffer
    InputChanged { text: String },
    /// Clear the conversation back to the welcome message
    Reset,
    FocusInput,
    /// Read the current session state
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Point-in-time view of a session
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: TurnState,
    pub messages: Vec<Message>,
    pub input: InputView,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("chat session has stopped")]
pub struct SessionClosed;

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    notice_tx: broadcast::Sender<Notice>,
}

impl SessionHandle {
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::Submit { text: text.into() }).await
    }

    pub async fn submit_input(&self) -> Result<(), SessionClosed> {
        self.send(Command::SubmitInput).await
    }

    pub async fn input_changed(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::InputChanged { text: text.into() }).await
    }

    pub async fn reset(&self) -> Result<(), SessionClosed> {
        self.send(Command::Reset).await
    }

    pub async fn focus_input(&self) -> Result<(), SessionClosed> {
        self.send(Command::FocusInput).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Lifecycle notices emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }

    async fn send(&self, command: Command) -> Result<(), SessionClosed> {
        self.command_tx.send(command).await.map_err(|_| SessionClosed)
    }
}
