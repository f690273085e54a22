// src/relay.rs
//! One polling cycle: fetch → skip seen → detect → format → publish.
//!
//! Nothing that goes wrong with a single item or feed ends the cycle.

use chrono::Utc;
use metrics::{counter, gauge};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::detector::EventDetector;
use crate::format::ContentFormatter;
use crate::ingest::{self, seen::SeenItems, types::FeedSource};
use crate::notify::Publisher;

const TITLE_LOG_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub new: usize,
    pub events: usize,
    pub published: usize,
    pub format_errors: usize,
    pub publish_errors: usize,
}

pub struct Relay {
    detector: EventDetector,
    formatter: ContentFormatter,
    publisher: Box<dyn Publisher>,
    seen: Mutex<SeenItems>,
    publish_delay: Duration,
}

impl Relay {
    pub fn new(cfg: &Config, publisher: Box<dyn Publisher>) -> Self {
        Self {
            detector: EventDetector::from_config(&cfg.detector),
            formatter: ContentFormatter::new(&cfg.formatter),
            publisher,
            seen: Mutex::new(SeenItems::with_capacity(cfg.relay.seen_capacity)),
            publish_delay: Duration::from_secs(cfg.relay.publish_delay_secs),
        }
    }

    /// Pause between two sends; zero in tests.
    pub fn with_publish_delay(mut self, delay: Duration) -> Self {
        self.publish_delay = delay;
        self
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn is_seen(&self, key: &str) -> bool {
        self.seen.lock().map(|s| s.contains(key)).unwrap_or(false)
    }

    fn mark_seen(&self, key: String) {
        if let Ok(mut s) = self.seen.lock() {
            s.insert(key);
        }
    }

    pub async fn run_cycle(&self, sources: &[Box<dyn FeedSource>]) -> CycleReport {
        let items = ingest::fetch_all(sources).await;
        let mut report = CycleReport {
            fetched: items.len(),
            ..CycleReport::default()
        };

        for item in items {
            let key = item.seen_key();
            if self.is_seen(&key) {
                continue;
            }
            report.new += 1;
            counter!("relay_items_new_total").increment(1);
            let title: String = item.title.chars().take(TITLE_LOG_CHARS).collect();

            if !self.detector.is_event(&item) {
                debug!(target: "relay", %title, source = %item.source_name, "not an event");
                self.mark_seen(key);
                continue;
            }
            report.events += 1;
            counter!("relay_events_detected_total").increment(1);
            debug!(
                target: "relay",
                %title,
                matched = ?self.detector.matched_keywords(&item),
                "event detected"
            );

            let message = match self.formatter.format(&item) {
                Ok(m) => m,
                Err(e) => {
                    warn!(target: "relay", error = %e, source = %item.source_name, "skipping item");
                    counter!("relay_format_errors_total").increment(1);
                    report.format_errors += 1;
                    self.mark_seen(key);
                    continue;
                }
            };

            if report.published + report.publish_errors > 0 && !self.publish_delay.is_zero() {
                tokio::time::sleep(self.publish_delay).await;
            }

            match self.publisher.publish(&message).await {
                Ok(()) => {
                    info!(
                        target: "relay",
                        %title,
                        source = %item.source_name,
                        publisher = self.publisher.name(),
                        "published event"
                    );
                    counter!("relay_published_total").increment(1);
                    report.published += 1;
                    self.mark_seen(key);
                }
                Err(e) => {
                    // Left unseen: the next cycle tries again.
                    error!(target: "relay", error = ?e, %title, "publish failed");
                    counter!("relay_publish_errors_total").increment(1);
                    report.publish_errors += 1;
                }
            }
        }

        gauge!("relay_last_cycle_ts").set(Utc::now().timestamp() as f64);
        info!(
            target: "relay",
            fetched = report.fetched,
            new = report.new,
            events = report.events,
            published = report.published,
            seen = self.seen_count(),
            "cycle finished"
        );
        report
    }
}
