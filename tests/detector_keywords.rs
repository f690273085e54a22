// tests/detector_keywords.rs
// Keyword gate behaviour with the default (Persian + English) vocabulary.

use feed_event_relay::config::DetectorConfig;
use feed_event_relay::{EventDetector, FeedItem};

fn item(title: &str, description: &str) -> FeedItem {
    FeedItem {
        title: title.into(),
        description_html: description.into(),
        link: "https://t.me/c/1".into(),
        source_name: "C".into(),
        ..FeedItem::default()
    }
}

fn default_detector() -> EventDetector {
    EventDetector::from_config(&DetectorConfig::default())
}

#[test]
fn upper_cased_keyword_title_is_detected() {
    let d = default_detector();
    assert!(d.is_event(&item("WEBINAR", "")));
    assert!(d.is_event(&item("Annual CONFERENCE", "")));
}

#[test]
fn persian_announcement_is_detected() {
    let d = default_detector();
    assert!(d.is_event(&item("", "<p>🔹 وبینار رایگان هوش مصنوعی</p>")));
    assert!(d.is_event(&item("خبر", "برای ثبت نام کلیک کنید")));
}

#[test]
fn unrelated_news_is_not_detected() {
    let d = default_detector();
    assert!(!d.is_event(&item("Quarterly numbers", "<p>Revenue grew 4% this quarter.</p>")));
}

#[test]
fn keywords_inside_longer_words_still_match() {
    let d = EventDetector::new(&["class"]);
    assert!(d.is_event(&item("A classic story", "")));
}

#[test]
fn html_entities_in_title_are_decoded() {
    let d = EventDetector::new(&["q&a session"]);
    assert!(d.is_event(&item("Q&amp;A Session", "")));
}

#[test]
fn classification_is_deterministic_across_calls() {
    let d = default_detector();
    let items = [
        item("Workshop", ""),
        item("nothing here", "<b>plain</b>"),
        item("", "<i>online</i> meetup"),
    ];
    let first: Vec<bool> = items.iter().map(|i| d.is_event(i)).collect();
    let second: Vec<bool> = items.iter().rev().map(|i| d.is_event(i)).collect();
    assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
    assert_eq!(first, vec![true, false, true]);
}
