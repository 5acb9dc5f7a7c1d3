//! Chat session core
//!
//! One conversational turn at a time against a remote chat endpoint: an
//! ordered transcript, a turn lifecycle state machine that disables input
//! while a request is in flight, and a renderer that turns assistant markup
//! into sanitized display blocks.

pub mod client;
pub mod config;
pub mod display;
pub mod history;
pub mod input;
pub mod message;
pub mod render;
pub mod runtime;
pub mod state_machine;
pub mod transcript;
