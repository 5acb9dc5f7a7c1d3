//! Transcript message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named entities extracted by the assistant, keyed by entity type
pub type Entities = BTreeMap<String, String>;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    System,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
            Sender::System => "system",
        }
    }

    /// User text is untrusted and only ever escaped
    pub fn is_trusted(self) -> bool {
        !matches!(self, Sender::User)
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSender(pub String);

impl fmt::Display for UnknownSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sender role: {}", self.0)
    }
}

impl std::error::Error for UnknownSender {}

impl FromStr for Sender {
    type Err = UnknownSender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            "system" => Ok(Sender::System),
            other => Err(UnknownSender(other.to_string())),
        }
    }
}

/// Message content before it is stamped with an id and timestamp.
///
/// The state machine produces drafts; the runtime turns them into
/// [`Message`]s at the moment they are appended to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub sender: Sender,
    pub text: String,
    pub intent: Option<String>,
    pub entities: Option<Entities>,
}

impl MessageDraft {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            intent: None,
            entities: None,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            intent: None,
            entities: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            text: text.into(),
            intent: None,
            entities: None,
        }
    }

    #[must_use]
    pub fn with_intent(mut self, intent: Option<String>) -> Self {
        self.intent = intent;
        self
    }

    #[must_use]
    pub fn with_entities(mut self, entities: Option<Entities>) -> Self {
        self.entities = entities;
        self
    }
}

/// A message in the transcript. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    id: String,
    sender: Sender,
    text: String,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entities: Option<Entities>,
}

impl Message {
    /// Stamp a draft with a fresh id and the current time
    pub fn from_draft(draft: MessageDraft) -> Self {
        Self::from_draft_at(draft, Utc::now())
    }

    pub fn from_draft_at(draft: MessageDraft, timestamp: DateTime<Utc>) -> Self {
        let MessageDraft {
            sender,
            text,
            intent,
            entities,
        } = draft;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            text,
            timestamp,
            intent,
            entities,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn intent(&self) -> Option<&str> {
        self.intent.as_deref()
    }

    pub fn entities(&self) -> Option<&Entities> {
        self.entities.as_ref()
    }

    /// Wire-level projection sent as conversation history
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            sender: self.sender,
            text: self.text.clone(),
        }
    }
}

/// One entry of the history sent with every turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}
