//! Ordered, append-only log of the active session's messages

use crate::message::Message;

/// The transcript of one chat session.
///
/// Index 0 is the welcome message and survives every reset.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    messages: Vec<Message>,
}

impl TranscriptStore {
    pub fn new(welcome: Message) -> Self {
        Self {
            messages: vec![welcome],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Truncate back to the welcome message
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true: the welcome message is always present
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
