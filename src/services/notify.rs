// src/services/notify.rs

//! Notification sinks.
//!
//! The change detector hands rendered messages to a `NotificationSink` and
//! treats any failure as non-fatal. Retrying is the sink's own business.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::DeliveryError;
use crate::models::TelegramConfig;

/// Delivers one human-readable message to the subscriber.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Request body of the Bot API `sendMessage` method.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Sends messages to a fixed Telegram chat with bounded retry.
#[derive(Debug, Clone)]
pub struct TelegramSink {
    client: Client,
    endpoint: String,
    chat_id: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl TelegramSink {
    /// Build a sink from config; token and chat id must be present.
    pub fn new(config: &TelegramConfig) -> Result<Self, DeliveryError> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| DeliveryError::NotConfigured("missing bot token".to_string()))?;
        let chat_id = config
            .chat_id
            .as_deref()
            .ok_or_else(|| DeliveryError::NotConfigured("missing chat id".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DeliveryError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                token
            ),
            chat_id: chat_id.to_string(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn send_once(&self, text: &str) -> Result<(), DeliveryError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::transient(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        Err(DeliveryError::transient(format!(
            "HTTP status {status}: {}",
            detail.trim()
        )))
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        let mut last = String::new();
        for attempt in 1..=self.max_attempts {
            match self.send_once(text).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::warn!(
                        "Telegram send attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    last = e.to_string();
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        Err(DeliveryError::Exhausted {
            attempts: self.max_attempts,
            last,
        })
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        log::info!("Notification:\n{}", text);
        Ok(())
    }
}
