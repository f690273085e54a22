//! Feed event relay: binary entrypoint.
//! Loads config, starts the polling loop and serves the health endpoint.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_event_relay::api::{self, AppState};
use feed_event_relay::ingest::{self, scheduler};
use feed_event_relay::{Config, LogPublisher, Publisher, Relay, TelegramPublisher};

/// Compact logs by default, JSON with LOG_FORMAT=json. RUST_LOG overrides the filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed_event_relay=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn build_publisher() -> Result<Box<dyn Publisher>> {
    if std::env::var("DRY_RUN").ok().as_deref() == Some("1") {
        tracing::warn!("DRY_RUN=1, messages are logged instead of sent");
        return Ok(Box::new(LogPublisher));
    }
    let telegram = TelegramPublisher::from_env()
        .context("TELEGRAM_BOT_TOKEN and TARGET_CHANNEL are required (or set DRY_RUN=1)")?;
    tracing::info!(chat = telegram.chat_id(), "publishing to telegram");
    Ok(Box::new(telegram))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::load_default().context("loading relay config")?;
    tracing::info!(
        feeds = cfg.feeds.len(),
        keywords = cfg.detector.keywords.len(),
        interval_secs = cfg.relay.poll_interval_secs,
        "application starting"
    );

    let metrics = match feed_event_relay::telemetry::install_recorder() {
        Ok(h) => Some(h),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics disabled");
            None
        }
    };

    let relay = Arc::new(Relay::new(&cfg, build_publisher()?));
    let sources = Arc::new(ingest::providers_from_config(&cfg)?);
    let monitor = scheduler::spawn_scheduler((&cfg.relay).into(), relay.clone(), sources);

    let state = AppState { relay, metrics };
    let addr = SocketAddr::from(([0, 0, 0, 0], api::port_from_env()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding health endpoint on {addr}"))?;
    tracing::info!(%addr, "web server started");

    let server = axum::serve(listener, api::router(state)).with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown requested");
    });
    let result = server.await.context("health server");

    monitor.abort();
    tracing::info!("application stopped");
    result
}
