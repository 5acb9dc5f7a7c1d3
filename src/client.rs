//! Remote chat endpoint abstraction
//!
//! The endpoint is a black box: one request carrying the new message and the
//! history, one reply or one classified failure.

mod error;
mod http;
mod types;

pub use error::{ClientError, ClientErrorKind};
pub use http::HttpChatClient;
pub use types::{ChatReply, ChatRequest};

use async_trait::async_trait;
use std::sync::Arc;

/// Sends one turn to the assistant
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ClientError>;
}

#[async_trait]
impl<T: ChatClient + ?Sized> ChatClient for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        (**self).send(request).await
    }
}

/// Logging wrapper for chat clients
pub struct LoggingClient {
    inner: Arc<dyn ChatClient>,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn ChatClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ChatClient for LoggingClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    history_len = request.history.len(),
                    intent = reply.intent.as_deref().unwrap_or(""),
                    "Chat request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    history_len = request.history.len(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Chat request failed"
                );
            }
        }

        result
    }
}
