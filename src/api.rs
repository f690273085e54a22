// src/api.rs
//! Liveness endpoint for the hosting platform, plus `/metrics`.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::relay::Relay;

pub const DEFAULT_PORT: u16 = 7860;
pub const ENV_PORT: &str = "PORT";

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> String {
    format!("Bot is running! Processed items: {}", state.relay.seen_count())
}

async fn render_metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}

/// `PORT` from the environment, default 7860.
pub fn port_from_env() -> u16 {
    std::env::var(ENV_PORT)
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}
