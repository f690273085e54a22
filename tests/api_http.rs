// tests/api_http.rs
//
// HTTP-level tests for the health Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use feed_event_relay::api::{self, AppState};
use feed_event_relay::{Config, LogPublisher, Relay};

const BODY_LIMIT: usize = 64 * 1024;

fn test_router() -> Router {
    let relay = Arc::new(Relay::new(&Config::default(), Box::new(LogPublisher)));
    api::router(AppState {
        relay,
        metrics: None,
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, String::from_utf8(bytes).expect("utf8"))
}

#[tokio::test]
async fn health_reports_processed_items() {
    let (status, body) = get(test_router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Bot is running! Processed items: 0");
}

#[tokio::test]
async fn root_is_an_alias_of_health() {
    let (status, body) = get(test_router(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("Bot is running!"));
}

#[tokio::test]
async fn metrics_without_recorder_is_404() {
    let (status, _) = get(test_router(), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
