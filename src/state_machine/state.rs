//! Turn lifecycle state types

use crate::client::ClientErrorKind;

/// The single in-flight turn: the user text awaiting an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub pending_text: String,
}

impl Turn {
    pub fn new(pending_text: impl Into<String>) -> Self {
        Self {
            pending_text: pending_text.into(),
        }
    }
}

/// Lifecycle of one turn
///
/// `Resolved` and `Failed` are transient: both return to `Idle` as soon as
/// the turn's cleanup runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnState {
    /// Ready for user input, no pending request
    #[default]
    Idle,

    /// User message recorded, history being composed
    Sending { turn: Turn },

    /// Request in flight, typing placeholder shown
    Awaiting { turn: Turn },

    /// Reply appended, cleanup pending
    Resolved,

    /// Apology appended, cleanup pending
    Failed { kind: ClientErrorKind },
}

impl TurnState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TurnState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::Sending { .. } => "sending",
            TurnState::Awaiting { .. } => "awaiting",
            TurnState::Resolved => "resolved",
            TurnState::Failed { .. } => "failed",
        }
    }

    pub fn turn(&self) -> Option<&Turn> {
        match self {
            TurnState::Sending { turn } | TurnState::Awaiting { turn } => Some(turn),
            _ => None,
        }
    }
}
