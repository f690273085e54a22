// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One feed entry, as handed to the detector and the formatter.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub description_html: String, // raw markup, may be empty
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: String,
    pub source_handle: Option<String>,
    pub guid: Option<String>,
}

impl FeedItem {
    /// Id used to remember the item between cycles: `<handle or name>_<guid or link>`.
    pub fn seen_key(&self) -> String {
        let source = self.source_handle.as_deref().unwrap_or(&self.source_name);
        let id = self
            .guid
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or(&self.link);
        format!("{source}_{id}")
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>>;
    fn name(&self) -> &str;
}
