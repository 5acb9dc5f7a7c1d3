//! HTTP implementation of the chat endpoint contract

use super::{ChatClient, ChatReply, ChatRequest, ClientError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const CHAT_PATH: &str = "/api/chat";

/// Client for `POST {endpoint}/api/chat`
pub struct HttpChatClient {
    client: Client,
    url: String,
}

impl HttpChatClient {
    /// `connect_timeout` bounds connection setup only; the turn deadline is
    /// enforced by the runtime.
    pub fn new(endpoint: &str, connect_timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}{CHAT_PATH}", endpoint.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            // The body is only useful for the log line
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::remote(
                status.as_u16(),
                format!("HTTP error! status: {status}: {body}"),
            ));
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<ChatReply>(&body)
            .map_err(|e| ClientError::malformed(format!("Invalid reply body: {e}")))
    }
}
