//! Events that drive the turn lifecycle

use crate::client::{ChatReply, ClientError};
use crate::message::HistoryEntry;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Submit { text: String },
    ResetRequested,

    // Runtime events
    HistoryReady { history: Vec<HistoryEntry> },
    TurnFinished,

    // Endpoint events
    ReplyReceived { reply: ChatReply },
    RequestFailed { error: ClientError },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Submit { .. } => "submit",
            Event::ResetRequested => "reset_requested",
            Event::HistoryReady { .. } => "history_ready",
            Event::TurnFinished => "turn_finished",
            Event::ReplyReceived { .. } => "reply_received",
            Event::RequestFailed { .. } => "request_failed",
        }
    }
}
