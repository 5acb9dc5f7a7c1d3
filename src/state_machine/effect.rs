//! Effects produced by state transitions

use crate::client::{ChatRequest, ClientErrorKind};
use crate::message::MessageDraft;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Enable or disable the input surface
    SetInputEnabled { enabled: bool },

    /// Stamp the draft and append it to the transcript, then render it
    AppendMessage { draft: MessageDraft },

    /// Empty the input buffer
    ClearInput,

    /// Compute history from the configured source (yields `HistoryReady`)
    ComposeHistory,

    ShowTyping,

    HideTyping,

    /// Issue the request in the background (yields a reply or failure event)
    SendRequest { request: ChatRequest },

    /// Run turn cleanup (yields `TurnFinished`)
    FinishTurn,

    FocusInput,

    /// Truncate the transcript to the welcome message
    ResetTranscript,

    /// Notify session observers
    Notify { notice: Notice },
}

impl Effect {
    pub fn append_user(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            draft: MessageDraft::user(text),
        }
    }

    pub fn append(draft: MessageDraft) -> Self {
        Effect::AppendMessage { draft }
    }

    pub fn notify(notice: Notice) -> Self {
        Effect::Notify { notice }
    }
}

/// How a finished turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Resolved,
    Failed { kind: ClientErrorKind },
}

/// Lifecycle notifications broadcast to session observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    TurnStarted { text: String },
    TurnFinished { outcome: TurnOutcome },
    SessionReset,
}
