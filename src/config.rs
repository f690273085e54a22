// src/config.rs
//! Relay configuration: feeds, keywords, formatter labels and limits.
//!
//! Loaded once at start-up from TOML and then shared read-only.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";
pub const ENV_CONFIG_PATH: &str = "RELAY_CONFIG_PATH";

/// Persian + English event vocabulary.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "وبینار", "webinar", "کارگاه", "workshop", "سمینار", "seminar", "کنفرانس", "conference",
    "همایش", "congress", "نشست", "meeting", "دوره آموزشی", "course", "کلاس", "class", "ایونت",
    "event", "برگزار", "organize", "شرکت", "participate", "ثبت نام", "register", "رایگان", "free",
    "آنلاین", "online", "مجازی", "virtual", "آموزش", "training", "فراخوان", "call", "گواهی",
    "certificate", "مدرک", "certification", "لایو", "live", "join",
];

pub const DEFAULT_FORWARDED_PHRASES: &[&str] = &["Forwarded From", "Forwarded from", "هدایت شده از"];

pub const DEFAULT_DATE_FORMAT: &str = "%d %b %Y - %H:%M (UTC)";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub relay: RelayConfig,
    pub feeds: Vec<FeedConfig>,
    pub detector: DetectorConfig,
    pub formatter: FormatterConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    /// Channel handle used for the source link (`https://t.me/<channel>`).
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub poll_interval_secs: u64,
    pub startup_delay_secs: u64,
    /// Pause between two published messages.
    pub publish_delay_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_items_per_feed: usize,
    /// Upper bound of remembered item ids (in memory only).
    pub seen_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub forwarded_phrases: Vec<String>,
    pub view_post_label: String,
    pub source_label: String,
    pub published_label: String,
    pub channel_base_url: String,
    pub date_format: String,
    pub max_body_chars: usize,
    pub max_message_chars: usize,
    /// Prefix every line with U+200F for right-to-left channels.
    pub rtl_mark: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            feeds: default_feeds(),
            detector: DetectorConfig::default(),
            formatter: FormatterConfig::default(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 600,
            startup_delay_secs: 10,
            publish_delay_secs: 5,
            fetch_timeout_secs: 30,
            max_items_per_feed: 10,
            seen_capacity: 1500,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            forwarded_phrases: DEFAULT_FORWARDED_PHRASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            view_post_label: "View Post".into(),
            source_label: "Source:".into(),
            published_label: "Published:".into(),
            channel_base_url: "https://t.me/".into(),
            date_format: DEFAULT_DATE_FORMAT.into(),
            max_body_chars: 2500,
            max_message_chars: 4096,
            rtl_mark: false,
        }
    }
}

fn default_feeds() -> Vec<FeedConfig> {
    [
        ("WinCell Co", "wincellco"),
        ("Rayazistazma", "Rayazistazma"),
        ("SBU Bio Society", "SBUBIOSOCIETY"),
    ]
    .into_iter()
    .map(|(name, channel)| FeedConfig {
        name: name.to_string(),
        url: format!("https://rsshub.app/telegram/channel/{channel}"),
        channel: Some(channel.to_string()),
    })
    .collect()
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: Config = toml::from_str(s).context("parsing relay config toml")?;
        cfg.clean();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading relay config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Load using env var + fallbacks:
    /// 1) $RELAY_CONFIG_PATH (must exist)
    /// 2) config/relay.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from(&default_path);
        }
        tracing::info!(target: "config", "no config file found, using built-in defaults");
        Ok(Self::default())
    }

    fn clean(&mut self) {
        self.detector.keywords = clean_list(std::mem::take(&mut self.detector.keywords));
        self.formatter.forwarded_phrases =
            clean_list(std::mem::take(&mut self.formatter.forwarded_phrases));

        for feed in &mut self.feeds {
            feed.name = feed.name.trim().to_string();
            feed.url = feed.url.trim().to_string();
            feed.channel = feed
                .channel
                .take()
                .map(|c| c.trim().trim_start_matches('@').to_string())
                .filter(|c| !c.is_empty());
        }
        self.feeds.retain(|f| {
            let keep = !f.url.is_empty();
            if !keep {
                tracing::warn!(target: "config", feed = %f.name, "dropping feed without url");
            }
            keep
        });
    }

    fn validate(&self) -> Result<()> {
        if self.relay.poll_interval_secs == 0 {
            return Err(anyhow!("relay.poll_interval_secs must be > 0"));
        }
        if self.relay.seen_capacity == 0 {
            return Err(anyhow!("relay.seen_capacity must be > 0"));
        }
        if self.formatter.max_message_chars == 0 {
            return Err(anyhow!("formatter.max_message_chars must be > 0"));
        }
        Ok(())
    }
}

/// Trim entries, drop blanks and repeats; order is kept.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.feeds.len(), 3);
        assert!(cfg.detector.keywords.iter().any(|k| k == "webinar"));
    }

    #[test]
    fn lists_are_trimmed_and_deduped_in_order() {
        let cfg = Config::from_toml_str(
            r#"
[detector]
keywords = [" Webinar ", "", "کارگاه", "Webinar"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.detector.keywords, vec!["Webinar", "کارگاه"]);
    }

    #[test]
    fn feeds_without_url_are_dropped_and_handles_cleaned() {
        let cfg = Config::from_toml_str(
            r#"
[[feeds]]
name = "A"
url = "https://rsshub.app/telegram/channel/a"
channel = " @a "

[[feeds]]
name = "B"
url = "  "
"#,
        )
        .unwrap();
        assert_eq!(cfg.feeds.len(), 1);
        assert_eq!(cfg.feeds[0].channel.as_deref(), Some("a"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = Config::from_toml_str("[relay]\npoll_interval_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }
}
