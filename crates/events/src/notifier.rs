// In crates/events/src/notifier.rs

use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// A best-effort sink for human-readable messages.
///
/// Callers log and drop delivery errors; a failing notifier must never stop
/// a trading loop.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Writes every message to the log. Used when no chat is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        tracing::info!(target: "notifier", "{}", message);
        Ok(())
    }
}

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Sends messages to a Telegram chat through the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http_client: Client,
    api_url: String,
    token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::NotifierError(format!("failed to build the HTTP client: {}", e)))?;
        Ok(Self::with_client(TELEGRAM_API_URL, http_client, token, chat_id))
    }

    pub fn with_client(
        api_url: impl Into<String>,
        http_client: Client,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let response = self
            .http_client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text: message,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::NotifierError(format!("Telegram answered {}: {}", status, body)));
        }
        tracing::debug!(chat_id = %self.chat_id, "Telegram message sent.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_never_fails() {
        assert!(LogNotifier.notify("hello").await.is_ok());
    }

    #[test]
    fn api_url_is_normalized() {
        let notifier = TelegramNotifier::with_client("https://example.org/", Client::new(), "t", "c");
        assert_eq!(notifier.api_url, "https://example.org");
    }
}
