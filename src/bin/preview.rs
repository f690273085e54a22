//! Fetch the configured feeds once and print what would be published (nothing is sent).

use feed_event_relay::{ingest, Config, ContentFormatter, EventDetector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = Config::load_default()?;
    let detector = EventDetector::from_config(&cfg.detector);
    let formatter = ContentFormatter::new(&cfg.formatter);
    let sources = ingest::providers_from_config(&cfg)?;

    for item in ingest::fetch_all(&sources).await {
        if !detector.is_event(&item) {
            continue;
        }
        match formatter.format(&item) {
            Ok(message) => println!("----- {} -----\n{message}\n", item.source_name),
            Err(e) => eprintln!("skipped: {e}"),
        }
    }

    println!("preview done");
    Ok(())
}
