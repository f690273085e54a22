// src/ingest/providers/rss.rs
//! RSS 2.0 feed provider (RSSHub's Telegram channel feeds in the default config).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::ingest::types::{FeedItem, FeedSource};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

// <guid isPermaLink="false">...</guid>; the attribute is ignored.
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text", default)]
    value: String,
}

/// RFC 2822 first (RSS), RFC 3339 as fallback; anything else is dropped.
fn parse_pub_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    DateTime::parse_from_rfc2822(ts)
        .or_else(|_| DateTime::parse_from_rfc3339(ts))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| tracing::debug!(target: "ingest", error = %e, ts, "unparseable pubDate"))
        .ok()
}

pub struct RssFeedProvider {
    feed: FeedConfig,
    max_items: usize,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl RssFeedProvider {
    pub fn from_fixture_str(feed: FeedConfig, xml: &str) -> Self {
        Self {
            feed,
            max_items: usize::MAX,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(feed: FeedConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            feed,
            max_items: usize::MAX,
            mode: Mode::Http { client },
        })
    }

    /// Only the first `n` items of each fetch are returned.
    pub fn with_max_items(mut self, n: usize) -> Self {
        self.max_items = n;
        self
    }

    pub fn parse_items_from_str(&self, s: &str) -> Result<Vec<FeedItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean)
            .with_context(|| format!("parsing rss xml of {}", self.feed.name))?;

        let out: Vec<FeedItem> = rss
            .channel
            .item
            .into_iter()
            .take(self.max_items)
            .map(|it| FeedItem {
                title: it.title.unwrap_or_default().trim().to_string(),
                description_html: it.description.unwrap_or_default(),
                link: it.link.unwrap_or_default().trim().to_string(),
                published_at: it.pub_date.as_deref().and_then(parse_pub_date),
                source_name: self.feed.name.clone(),
                source_handle: self.feed.channel.clone(),
                guid: it.guid.map(|g| g.value.trim().to_string()).filter(|g| !g.is_empty()),
            })
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("relay_feed_parse_ms").record(ms);
        counter!("relay_items_fetched_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssFeedProvider {
    async fn fetch_items(&self) -> Result<Vec<FeedItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { client } => {
                tracing::info!(target: "ingest", feed = %self.feed.name, url = %self.feed.url, "fetching feed");
                let body = client
                    .get(&self.feed.url)
                    .send()
                    .await
                    .with_context(|| format!("GET {}", self.feed.url))?
                    .error_for_status()
                    .with_context(|| format!("non-2xx from {}", self.feed.url))?
                    .text()
                    .await
                    .context("reading feed body")?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.feed.name
    }
}

/// HTML entities that are not XML entities would abort the XML parse.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "…")
}
