//! Turn lifecycle state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `Idle → Sending → Awaiting → {Resolved, Failed} → Idle`.

mod effect;
mod event;
mod state;
mod transition;


pub use effect::{Effect, Notice, TurnOutcome};
pub use event::Event;
pub use state::{Turn, TurnState};
pub use transition::{
    transition, TransitionError, TransitionResult, APOLOGY_TEXT, ERROR_INTENT, RESET_NOTICE,
};
