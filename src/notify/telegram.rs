use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::Notifier;
use crate::config::TelegramConfig;

#[derive(Debug, Serialize, PartialEq)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'static str,
}

pub struct TelegramNotifier {
    endpoint: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, token: &str, chat_id: impl Into<String>, client: Client) -> Self {
        Self {
            endpoint: format!("{}/bot{token}/sendMessage", api_base.trim_end_matches('/')),
            chat_id: chat_id.into(),
            client,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `None` unless both token and chat id are set.
    pub fn from_config(cfg: &TelegramConfig, client: Client) -> Option<Self> {
        let token = cfg.token.as_deref()?;
        let chat_id = cfg.chat_id.as_deref()?;
        Some(
            Self::new(&cfg.api_base, token, chat_id, client)
                .with_timeout(Duration::from_millis(cfg.timeout_ms)),
        )
    }

    pub fn payload<'a>(&'a self, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
        }
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&self.payload(message))
            .send()
            .await
            .context("telegram post")?
            .error_for_status()
            .context("telegram non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
