//! Wire types for the chat endpoint

use crate::message::{Entities, HistoryEntry};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// Successful reply. `intent` and `entities` are optional and a missing or
/// `null` value is simply not rendered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default, deserialize_with = "deserialize_entities")]
    pub entities: Option<Entities>,
}

impl ChatReply {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            intent: None,
            entities: None,
        }
    }

    #[must_use]
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    #[must_use]
    pub fn with_entity(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities
            .get_or_insert_with(Entities::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Entity values come back from the backend as loosely typed JSON; keep
/// strings as-is and anything else as its JSON text.
fn deserialize_entities<'de, D>(deserializer: D) -> Result<Option<Entities>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Map<String, Value>>::deserialize(deserializer)?;
    Ok(raw.map(|map| {
        map.into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect()
    }))
}
