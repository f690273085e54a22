// src/notify/mod.rs
pub mod telegram;

use anyhow::Result;

pub use telegram::TelegramPublisher;

/// Downstream channel that receives formatted MarkdownV2 messages.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Dry-run publisher: logs instead of sending.
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

#[async_trait::async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, text: &str) -> Result<()> {
        tracing::info!(target: "notify", chars = text.chars().count(), "dry run, message not sent:\n{text}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
