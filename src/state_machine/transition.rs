//! Pure state transition function
//!
//! Given the same state and event this always yields the same new state and
//! effects; everything with side effects happens in the runtime.

use super::effect::{Notice, TurnOutcome};
use super::{Effect, Event, Turn, TurnState};
use crate::client::ChatRequest;
use crate::message::MessageDraft;
use thiserror::Error;

/// Text of the bot message that replaces a failed reply
pub const APOLOGY_TEXT: &str = "I'm sorry, I'm having trouble processing your request right now. \
                                Please try again or contact support for assistance.";

/// Intent attached to the apology message
pub const ERROR_INTENT: &str = "error";

/// System notice appended after the session is cleared
pub const RESET_NOTICE: &str = "Chat history cleared";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("A turn is already in flight")]
    TurnInFlight,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Guard rejections are silent no-ops, not failures
    pub fn is_guard_rejection(&self) -> bool {
        matches!(self, Self::EmptyMessage | Self::TurnInFlight)
    }
}

/// Pure transition function
pub fn transition(state: &TurnState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Submission guard
        // ============================================================

        // Idle + Submit -> Sending
        (TurnState::Idle, Event::Submit { text }) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            Ok(TransitionResult::new(TurnState::Sending {
                turn: Turn::new(text),
            })
            .with_effects([
                Effect::SetInputEnabled { enabled: false },
                Effect::append_user(text),
                Effect::ClearInput,
                Effect::notify(Notice::TurnStarted {
                    text: text.to_string(),
                }),
                Effect::ComposeHistory,
            ]))
        }

        // Busy + Submit/Reset -> reject
        (
            TurnState::Sending { .. }
            | TurnState::Awaiting { .. }
            | TurnState::Resolved
            | TurnState::Failed { .. },
            Event::Submit { .. } | Event::ResetRequested,
        ) => Err(TransitionError::TurnInFlight),

        // ============================================================
        // Request dispatch
        // ============================================================

        // Sending + HistoryReady -> Awaiting
        (TurnState::Sending { turn }, Event::HistoryReady { history }) => {
            let request = ChatRequest {
                message: turn.pending_text.clone(),
                history,
            };
            Ok(TransitionResult::new(TurnState::Awaiting { turn: turn.clone() })
                .with_effect(Effect::ShowTyping)
                .with_effect(Effect::SendRequest { request }))
        }

        // ============================================================
        // Resolution
        // ============================================================

        // Awaiting + ReplyReceived -> Resolved
        (TurnState::Awaiting { .. }, Event::ReplyReceived { reply }) => {
            let draft = MessageDraft::bot(reply.response)
                .with_intent(reply.intent)
                .with_entities(reply.entities);
            Ok(TransitionResult::new(TurnState::Resolved)
                .with_effect(Effect::HideTyping)
                .with_effect(Effect::append(draft))
                .with_effect(Effect::FinishTurn))
        }

        // Awaiting + RequestFailed -> Failed
        (TurnState::Awaiting { .. }, Event::RequestFailed { error }) => {
            let draft = MessageDraft::bot(APOLOGY_TEXT).with_intent(Some(ERROR_INTENT.to_string()));
            Ok(TransitionResult::new(TurnState::Failed { kind: error.kind })
                .with_effect(Effect::HideTyping)
                .with_effect(Effect::append(draft))
                .with_effect(Effect::FinishTurn))
        }

        // ============================================================
        // Cleanup: runs on both paths
        // ============================================================
        (TurnState::Resolved, Event::TurnFinished) => Ok(finish(TurnOutcome::Resolved)),

        (TurnState::Failed { kind }, Event::TurnFinished) => {
            Ok(finish(TurnOutcome::Failed { kind: *kind }))
        }

        // ============================================================
        // Session reset
        // ============================================================
        (TurnState::Idle, Event::ResetRequested) => Ok(TransitionResult::new(TurnState::Idle)
            .with_effects([
                Effect::ResetTranscript,
                Effect::append(MessageDraft::system(RESET_NOTICE)),
                Effect::notify(Notice::SessionReset),
            ])),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} + {}",
            state.name(),
            event.name()
        ))),
    }
}

fn finish(outcome: TurnOutcome) -> TransitionResult {
    TransitionResult::new(TurnState::Idle).with_effects([
        Effect::SetInputEnabled { enabled: true },
        Effect::FocusInput,
        Effect::notify(Notice::TurnFinished { outcome }),
    ])
}
