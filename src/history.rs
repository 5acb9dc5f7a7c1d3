//! Conversation history sent with each turn
//!
//! The transcript is the source of truth. Reconstructing from what the
//! display surface rendered is kept as a compatibility path; it is lossy
//! (formatting is flattened into text content) and tolerant rather than
//! strict: entries it cannot attribute to a known role are skipped.

use crate::message::{HistoryEntry, Message, Sender};
use crate::render::RenderedMessage;
use std::fmt;
use std::str::FromStr;

/// Where the history for the next request is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistorySource {
    #[default]
    Transcript,
    Rendered,
}

impl FromStr for HistorySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transcript" => Ok(HistorySource::Transcript),
            "rendered" => Ok(HistorySource::Rendered),
            other => Err(format!("unknown history source: {other}")),
        }
    }
}

impl fmt::Display for HistorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistorySource::Transcript => f.write_str("transcript"),
            HistorySource::Rendered => f.write_str("rendered"),
        }
    }
}

/// Canonical history: every message's own text, in transcript order
pub fn from_transcript(messages: &[Message]) -> Vec<HistoryEntry> {
    messages.iter().map(Message::to_history_entry).collect()
}

/// Best-effort history scraped from rendered entries
pub fn from_rendered(rendered: &[RenderedMessage]) -> Vec<HistoryEntry> {
    rendered
        .iter()
        .filter_map(|entry| {
            let Ok(sender) = entry.role.parse::<Sender>() else {
                tracing::trace!(role = %entry.role, "Skipping entry with unrecognized role");
                return None;
            };
            let text = match sender {
                Sender::User => entry
                    .primary_block()
                    .map(|b| b.text_content())
                    .unwrap_or_default(),
                Sender::Bot => entry
                    .primary_block()
                    .map_or_else(|| entry.full_text(), |b| b.text_content())
                    .trim()
                    .to_string(),
                Sender::System => entry.full_text(),
            };
            Some(HistoryEntry { sender, text })
        })
        .collect()
}
