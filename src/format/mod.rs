// src/format/mod.rs
//! Feed item -> Telegram MarkdownV2 message.
//!
//! Pipeline: parse the HTML into styled lines, drop a "Forwarded from ..."
//! first line, collapse a first line that only repeats the title into the
//! message heading, escape and re-emit as MarkdownV2, append the link, source
//! and date lines.

pub mod html;
pub mod markdown;

use chrono::format::{Item, StrftimeItems};
use once_cell::sync::OnceCell;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{FormatterConfig, DEFAULT_DATE_FORMAT};
use crate::ingest::types::FeedItem;
use html::StructuredText;

const RLM: char = '\u{200F}';
const TITLE_LOG_CHARS: usize = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("feed item '{title}' has no link")]
    MissingLink { title: String },
}

#[derive(Debug, Clone)]
pub struct ContentFormatter {
    cfg: FormatterConfig,
}

impl ContentFormatter {
    pub fn new(cfg: &FormatterConfig) -> Self {
        let mut cfg = cfg.clone();
        if StrftimeItems::new(&cfg.date_format).any(|i| matches!(i, Item::Error)) {
            warn!(target: "format", format = %cfg.date_format, "invalid date format, using default");
            cfg.date_format = DEFAULT_DATE_FORMAT.to_string();
        }
        Self { cfg }
    }

    pub fn format(&self, item: &FeedItem) -> Result<String, FormatError> {
        let link = item.link.trim();
        if link.is_empty() {
            return Err(FormatError::MissingLink {
                title: short_title(&item.title),
            });
        }
        let body = self.body(item);
        Ok(self.fit(item, link, &body))
    }

    /// Description as styled lines, before length limits.
    pub fn body(&self, item: &FeedItem) -> StructuredText {
        let mut body = StructuredText::parse(&item.description_html);
        if strip_forwarded_attribution(&mut body, &self.cfg.forwarded_phrases) {
            debug!(target: "format", title = %short_title(&item.title), "dropped forwarded line");
        }
        if title_repeats_first_line(&item.title, &body) {
            debug!(target: "format", title = %short_title(&item.title), "first line repeats title");
            make_heading(&mut body);
        }
        body
    }

    /// Shrink the body until the whole message fits `max_message_chars`.
    fn fit(&self, item: &FeedItem, link: &str, body: &StructuredText) -> String {
        let max = self.cfg.max_message_chars;
        let mut budget = self.cfg.max_body_chars.min(body.char_count());
        loop {
            let message = self.assemble(item, link, &body.truncated(budget));
            let len = message.chars().count();
            if len <= max || budget == 0 {
                if len > max {
                    warn!(target: "format", len, max, "message over limit even without body");
                }
                return message;
            }
            budget = budget.saturating_sub((len - max).max(1));
        }
    }

    fn assemble(&self, item: &FeedItem, link: &str, body: &StructuredText) -> String {
        let cfg = &self.cfg;
        let mut lines: Vec<String> = Vec::with_capacity(5);

        let rendered = markdown::render(body);
        if !rendered.is_empty() {
            lines.push(rendered);
            lines.push(String::new());
        }

        lines.push(format!("🔗 {}", markdown::link(&cfg.view_post_label, link)));

        if let Some(source) = self.source(item) {
            lines.push(format!("📢 {} {}", markdown::bold(&cfg.source_label), source));
        }

        if let Some(ts) = item.published_at {
            let date = ts.format(&cfg.date_format).to_string();
            lines.push(format!(
                "📅 {} {}",
                markdown::bold(&cfg.published_label),
                markdown::escape_text(&date)
            ));
        }

        let message = lines.join("\n");
        if cfg.rtl_mark {
            with_rtl_marks(&message)
        } else {
            message
        }
    }

    fn source(&self, item: &FeedItem) -> Option<String> {
        let name = item.source_name.trim();
        let handle = item
            .source_handle
            .as_deref()
            .map(|h| h.trim().trim_start_matches('@'))
            .filter(|h| !h.is_empty());
        match (name.is_empty(), handle) {
            (_, Some(handle)) => {
                let label = if name.is_empty() { handle } else { name };
                Some(markdown::link(label, &self.channel_url(handle)))
            }
            (false, None) => Some(markdown::escape_text(name)),
            (true, None) => None,
        }
    }

    fn channel_url(&self, handle: &str) -> String {
        format!("{}/{}", self.cfg.channel_base_url.trim_end_matches('/'), handle)
    }
}

/// Drop the first line if it reads "<phrase> <name>". Returns whether a
/// line was removed.
///
/// Lines follow the block and `<br>` rules of [`StructuredText::parse`]. Only
/// the fixed phrase is matched case-sensitively; the name can be anything,
/// including a link.
pub fn strip_forwarded_attribution(body: &mut StructuredText, phrases: &[String]) -> bool {
    let forwarded = body
        .first_line_text()
        .is_some_and(|first| is_forwarded_line(&first, phrases));
    if forwarded {
        body.lines.remove(0);
    }
    forwarded
}

fn is_forwarded_line(line: &str, phrases: &[String]) -> bool {
    let line = line.trim();
    phrases.iter().any(|phrase| {
        line.strip_prefix(phrase.as_str()).is_some_and(|rest| {
            rest.starts_with(|c: char| c.is_whitespace() || c == ':')
                && !rest.trim_start_matches(':').trim().is_empty()
        })
    })
}

fn title_repeats_first_line(title: &str, body: &StructuredText) -> bool {
    let title = comparable(&html_escape::decode_html_entities(title));
    if title.is_empty() {
        return false;
    }
    body.first_line_text()
        .is_some_and(|first| comparable(&first) == title)
}

/// Lower-cased text without leading decoration (emoji, bullets, `#`) or
/// trailing `.` / `:` / `…`, whitespace collapsed.
fn comparable(text: &str) -> String {
    static RE_LEADING: OnceCell<Regex> = OnceCell::new();
    static RE_TRAILING: OnceCell<Regex> = OnceCell::new();
    let re_leading = RE_LEADING
        .get_or_init(|| Regex::new(r"^[\p{So}\p{Sk}\p{Mn}\p{Cf}#٪•·\s]+").unwrap());
    let re_trailing = RE_TRAILING.get_or_init(|| Regex::new(r"[\s.:…]+$").unwrap());

    let out = re_leading.replace(text, "");
    let out = re_trailing.replace(&out, "");
    out.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The first line doubles as the title: show it once, in bold.
fn make_heading(body: &mut StructuredText) {
    if let Some(first) = body.lines.first_mut() {
        for span in first.iter_mut() {
            span.style.bold = true;
        }
        // Neighbours that only differed in boldness now share a style.
        first.dedup_by(|next, prev| {
            if next.style == prev.style {
                prev.text.push_str(&next.text);
                true
            } else {
                false
            }
        });
    }
}

fn with_rtl_marks(message: &str) -> String {
    message
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{RLM}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn short_title(title: &str) -> String {
    title.trim().chars().take(TITLE_LOG_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases() -> Vec<String> {
        vec!["Forwarded From".into(), "Forwarded from".into()]
    }

    fn strip(html: &str) -> String {
        let mut st = StructuredText::parse(html);
        strip_forwarded_attribution(&mut st, &phrases());
        st.to_plain_text()
    }

    #[test]
    fn strips_plain_forwarded_line() {
        assert_eq!(strip("Forwarded from X\n\nActual content"), "Actual content");
    }

    #[test]
    fn strips_linked_forwarded_paragraph() {
        let html = "<p>Forwarded From <a href=\"https://t.me/src\">Src</a></p><p>Body</p>";
        assert_eq!(strip(html), "Body");
    }

    #[test]
    fn strips_only_the_first_block() {
        assert_eq!(strip("<div>Forwarded from X</div><div>Actual</div>"), "Actual");
        assert_eq!(strip("<p>Forwarded from X<p>Actual"), "Actual");
        assert_eq!(strip("<li>Forwarded from X</li><li>Actual</li>"), "Actual");
    }

    #[test]
    fn phrase_is_case_sensitive_and_needs_a_name() {
        assert_eq!(strip("FORWARDED FROM X<br>b"), "FORWARDED FROM X\nb");
        assert_eq!(strip("Forwarded from<br>b"), "Forwarded from\nb");
    }

    #[test]
    fn only_first_line_is_checked() {
        assert_eq!(
            strip("Intro<br>Forwarded from X<br>rest"),
            "Intro\nForwarded from X\nrest"
        );
    }

    #[test]
    fn comparable_ignores_decoration_and_case() {
        assert_eq!(comparable("📢  Big   News:"), "big news");
        assert_eq!(comparable("🔹 وبینار رایگان…"), "وبینار رایگان");
    }

    #[test]
    fn heading_merges_spans() {
        let mut st = StructuredText::parse("<b>A</b> b<br>c");
        make_heading(&mut st);
        assert_eq!(st.lines[0].len(), 1);
        assert!(st.lines[0][0].style.bold);
        assert!(!st.lines[1][0].style.bold);
    }

    #[test]
    fn rtl_mark_prefixes_non_empty_lines() {
        assert_eq!(with_rtl_marks("a\n\nb"), "\u{200F}a\n\n\u{200F}b");
    }
}
