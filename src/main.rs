//! Terminal front end for a chat session
//!
//! Reads one line per turn from stdin. `/clear` resets the conversation and
//! `/quit` exits.

use chat_session::client::{HttpChatClient, LoggingClient};
use chat_session::config::SessionConfig;
use chat_session::display::DisplaySurface;
use chat_session::input::InputView;
use chat_session::render::RenderedMessage;
use chat_session::runtime::{SessionHandle, SessionRuntime};
use chat_session::state_machine::Notice;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prints each entry as plain text and keeps the rendered log
#[derive(Default)]
struct TerminalSurface {
    entries: Vec<RenderedMessage>,
}

impl DisplaySurface for TerminalSurface {
    fn append(&mut self, message: RenderedMessage) {
        println!("[{}] {}", message.role, message.full_text());
        self.entries.push(message);
    }

    fn clear_to_welcome(&mut self) {
        self.entries.truncate(1);
        println!("---");
    }

    fn show_typing(&mut self) {
        println!("...");
    }

    fn hide_typing(&mut self) {}

    fn scroll_to_latest(&mut self) {}

    fn update_input(&mut self, _view: &InputView) {}

    fn rendered(&self) -> Vec<RenderedMessage> {
        self.entries.clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_session=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = SessionConfig::from_env()?;
    let http = HttpChatClient::new(&config.endpoint, config.connect_timeout)?;
    tracing::info!(
        url = %http.url(),
        timeout = ?config.request_timeout,
        history_source = %config.history_source,
        "Chat client configured"
    );
    let client = LoggingClient::new(Arc::new(http));

    let (runtime, handle) = SessionRuntime::new(&config, client, TerminalSurface::default());
    let mut notices = handle.subscribe();
    let runtime = tokio::spawn(runtime.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/clear" => handle.reset().await?,
            _ => submit_and_wait(&handle, &mut notices, line).await?,
        }
    }

    drop(handle);
    runtime.await?;
    Ok(())
}

/// Submit one line and block until its turn finishes
async fn submit_and_wait(
    handle: &SessionHandle,
    notices: &mut broadcast::Receiver<Notice>,
    line: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let before = handle.snapshot().await?.messages.len();
    handle.submit(line).await?;
    if handle.snapshot().await?.messages.len() == before {
        // Rejected, e.g. blank input
        return Ok(());
    }

    loop {
        match notices.recv().await {
            Ok(Notice::TurnFinished { .. }) => return Ok(()),
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}
