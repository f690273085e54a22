// src/detector.rs
//! Keyword gate deciding whether a feed item announces an event.
//!
//! Matching is plain case-insensitive substring containment over title +
//! description text, with no word boundaries: "class" also hits "classic".
//! Cheap recall at the cost of some false positives.

use crate::config::DetectorConfig;
use crate::format::html;
use crate::ingest::types::FeedItem;

#[derive(Debug, Clone)]
pub struct EventDetector {
    /// Lower-cased, non-empty.
    keywords: Vec<String>,
}

impl EventDetector {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn from_config(cfg: &DetectorConfig) -> Self {
        Self::new(cfg.keywords.as_slice())
    }

    pub fn is_event(&self, item: &FeedItem) -> bool {
        let text = searchable_text(item);
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Keywords found in the item, in configured order.
    pub fn matched_keywords(&self, item: &FeedItem) -> Vec<&str> {
        let text = searchable_text(item);
        self.keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }
}

fn searchable_text(item: &FeedItem) -> String {
    let title = html_escape::decode_html_entities(&item.title);
    let description = html::to_plain_text(&item.description_html);
    format!("{title} {description}").to_lowercase()
}
