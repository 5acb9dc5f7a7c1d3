//! Session configuration

use crate::history::HistorySource;
use crate::input::InputMetrics;
use crate::render::RenderOptions;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";
pub const DEFAULT_WELCOME: &str =
    "Hello! I'm the campus assistant. Ask me about facilities, opening hours, or reporting an issue.";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuration for one chat session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL; requests go to `{endpoint}/api/chat`
    pub endpoint: String,
    /// Deadline for one turn's request. `None` waits forever.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub history_source: HistorySource,
    pub render: RenderOptions,
    pub welcome_text: String,
    pub input: InputMetrics,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            history_source: HistorySource::default(),
            render: RenderOptions::default(),
            welcome_text: DEFAULT_WELCOME.to_string(),
            input: InputMetrics::default(),
        }
    }
}

impl SessionConfig {
    /// Read configuration from `CHAT_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("CHAT_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Some(raw) = lookup("CHAT_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse("CHAT_REQUEST_TIMEOUT_SECS", &raw)?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(raw) = lookup("CHAT_HISTORY_SOURCE") {
            config.history_source = raw.parse().map_err(|reason| ConfigError::InvalidValue {
                var: "CHAT_HISTORY_SOURCE",
                value: raw.clone(),
                reason,
            })?;
        }

        if let Some(raw) = lookup("CHAT_DEBUG_ANNOTATIONS") {
            config.render.debug_annotations = parse_flag("CHAT_DEBUG_ANNOTATIONS", &raw)?;
        }

        if let Some(welcome) = lookup("CHAT_WELCOME") {
            config.welcome_text = welcome;
        }

        if let Some(raw) = lookup("CHAT_INPUT_MAX_HEIGHT") {
            config.input.max_height_px = parse("CHAT_INPUT_MAX_HEIGHT", &raw)?;
        }

        Ok(config)
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
