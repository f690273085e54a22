// src/notify/telegram.rs
use anyhow::{anyhow, Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Publisher;
use crate::format::markdown::PARSE_MODE;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TARGET_CHANNEL: &str = "TARGET_CHANNEL";
const API_BASE: &str = "https://api.telegram.org";
const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_MAX_SHIFT: u8 = 6;

/// Bot API `sendMessage` to one chat, with bounded retries.
#[derive(Clone)]
pub struct TelegramPublisher {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl std::fmt::Debug for TelegramPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramPublisher")
            .field("chat_id", &self.chat_id)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

impl TelegramPublisher {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            api_base: API_BASE.to_string(),
            token,
            chat_id,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    /// Reads `TELEGRAM_BOT_TOKEN` and `TARGET_CHANNEL`.
    pub fn from_env() -> Result<Self> {
        let token = non_empty_env(ENV_BOT_TOKEN)?;
        let chat_id = non_empty_env(ENV_TARGET_CHANNEL)?;
        Ok(Self::new(token, chat_id))
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Point at another Bot API host (local bot server, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    async fn send_once(&self, text: &str) -> std::result::Result<(), SendFailure> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: PARSE_MODE,
            disable_web_page_preview: true,
        };
        let rsp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendFailure::retry(format!("request failed: {}", e.without_url())))?;

        let status = rsp.status();
        let body: Option<ApiResponse> = rsp.json().await.ok();
        if status.is_success() && body.as_ref().is_some_and(|b| b.ok) {
            return Ok(());
        }

        let description = body
            .as_ref()
            .and_then(|b| b.description.clone())
            .unwrap_or_else(|| status.to_string());
        let retry_after = body
            .as_ref()
            .and_then(|b| b.parameters.as_ref())
            .and_then(|p| p.retry_after);

        // 400 (bad markup, unknown chat) will not get better by retrying.
        let transient = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
        Err(SendFailure {
            message: format!("telegram {status}: {description}"),
            transient,
            retry_after: retry_after.map(Duration::from_secs),
        })
    }
}

struct SendFailure {
    message: String,
    transient: bool,
    retry_after: Option<Duration>,
}

impl SendFailure {
    fn retry(message: String) -> Self {
        Self {
            message,
            transient: true,
            retry_after: None,
        }
    }
}

fn non_empty_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{key} missing"))
}

/// Wait before retry number `attempt` (1-based): 500ms doubling, capped at 32s.
fn backoff(attempt: u8) -> Duration {
    let shift = attempt.saturating_sub(1).min(BACKOFF_MAX_SHIFT);
    Duration::from_millis(BACKOFF_BASE_MS << shift)
}

#[async_trait::async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, text: &str) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.send_once(text).await {
                Ok(()) => return Ok(()),
                Err(failure) if failure.transient && attempt < self.max_retries => {
                    let wait = failure
                        .retry_after
                        .unwrap_or_else(|| backoff(attempt));
                    tracing::warn!(
                        target: "notify",
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %failure.message,
                        "telegram send failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(failure) => {
                    return Err(anyhow!(failure.message))
                        .with_context(|| format!("sendMessage to {}", self.chat_id));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
