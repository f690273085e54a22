// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod detector;
pub mod format;
pub mod ingest;
pub mod notify;
pub mod relay;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::detector::EventDetector;
pub use crate::format::{ContentFormatter, FormatError};
pub use crate::ingest::types::{FeedItem, FeedSource};
pub use crate::notify::{LogPublisher, Publisher, TelegramPublisher};
pub use crate::relay::{CycleReport, Relay};
