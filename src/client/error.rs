//! Chat client error types

use thiserror::Error;

/// Request failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transport, message)
    }

    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Remote { status }, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Malformed, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Timeout, message)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::malformed(err.to_string())
        } else {
            ClientError::transport(err.to_string())
        }
    }
}

/// How a request failed. Every kind ends the turn the same way; the
/// distinction only feeds diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Connection refused, reset, DNS
    Transport,
    /// Endpoint answered with a non-success status
    Remote { status: u16 },
    /// Success status but the body was not a reply
    Malformed,
    /// No answer within the configured deadline
    Timeout,
}

impl ClientErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Remote { .. } => "remote",
            Self::Malformed => "malformed",
            Self::Timeout => "timeout",
        }
    }
}
