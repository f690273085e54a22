// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod seen;
pub mod types;

use crate::config::Config;
use crate::ingest::providers::RssFeedProvider;
use crate::ingest::types::{FeedItem, FeedSource};
use anyhow::Result;
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use std::time::Duration;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("relay_cycles_total", "Relay cycles run by the scheduler.");
        describe_counter!("relay_items_fetched_total", "Items parsed from feeds.");
        describe_counter!("relay_items_new_total", "Items not seen in earlier cycles.");
        describe_counter!(
            "relay_events_detected_total",
            "Items classified as event announcements."
        );
        describe_counter!("relay_published_total", "Messages sent downstream.");
        describe_counter!(
            "relay_publish_errors_total",
            "Messages that failed after all retries."
        );
        describe_counter!(
            "relay_format_errors_total",
            "Items skipped because they could not be formatted."
        );
        describe_counter!("relay_feed_errors_total", "Feed fetch/parse errors.");
        describe_histogram!("relay_feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("relay_last_cycle_ts", "Unix ts when the last cycle finished.");
    });
}

/// HTTP providers for every configured feed.
pub fn providers_from_config(cfg: &Config) -> Result<Vec<Box<dyn FeedSource>>> {
    let timeout = Duration::from_secs(cfg.relay.fetch_timeout_secs);
    cfg.feeds
        .iter()
        .map(|feed| {
            let provider = RssFeedProvider::from_url(feed.clone(), timeout)?
                .with_max_items(cfg.relay.max_items_per_feed);
            Ok(Box::new(provider) as Box<dyn FeedSource>)
        })
        .collect()
}

/// Fetch all feeds concurrently. A failing feed is logged and contributes
/// nothing; items keep feed order, then item order.
pub async fn fetch_all(sources: &[Box<dyn FeedSource>]) -> Vec<FeedItem> {
    ensure_metrics_described();

    let results = join_all(sources.iter().map(|s| s.fetch_items())).await;

    let mut items = Vec::new();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(mut v) => {
                tracing::info!(target: "ingest", feed = source.name(), entries = v.len(), "fetched feed");
                items.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, feed = source.name(), "feed error");
                counter!("relay_feed_errors_total").increment(1);
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Fixed(&'static str, usize);
    struct Broken;

    #[async_trait::async_trait]
    impl FeedSource for Fixed {
        async fn fetch_items(&self) -> Result<Vec<FeedItem>> {
            Ok((0..self.1)
                .map(|i| FeedItem {
                    title: format!("{} {i}", self.0),
                    link: format!("https://t.me/{}/{i}", self.0),
                    source_name: self.0.into(),
                    ..FeedItem::default()
                })
                .collect())
        }
        fn name(&self) -> &str {
            self.0
        }
    }

    #[async_trait::async_trait]
    impl FeedSource for Broken {
        async fn fetch_items(&self) -> Result<Vec<FeedItem>> {
            Err(anyhow!("feed down"))
        }
        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn failing_feed_does_not_hide_others() {
        let sources: Vec<Box<dyn FeedSource>> =
            vec![Box::new(Fixed("a", 2)), Box::new(Broken), Box::new(Fixed("b", 1))];
        let items = fetch_all(&sources).await;
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a 0", "a 1", "b 0"]);
    }

    #[test]
    fn one_provider_per_feed() {
        let cfg = Config::default();
        let providers = providers_from_config(&cfg).unwrap();
        assert_eq!(providers.len(), cfg.feeds.len());
        assert_eq!(providers[0].name(), "WinCell Co");
    }
}
