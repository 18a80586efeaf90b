mod common;

use axum::http::StatusCode;
use common::{TestApp, TestOptions};
use serde_json::Value;

#[tokio::test]
async fn test_health_endpoint_success() {
    let app = TestApp::new();

    let response = app.server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["network"]["state"], "online");
    assert_eq!(json["checks"]["volatile_cache"]["status"], "ok");
    assert_eq!(json["checks"]["durable_cache"]["status"], "ok");
}

#[tokio::test]
async fn test_health_endpoint_structure() {
    let app = TestApp::new();

    let json = app.server.get("/health").await.json::<Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json["network"].get("last_probe_seconds_ago").is_some());
    assert!(json["network"].get("probe_cooldown_seconds").is_some());
    assert!(json["checks"].get("volatile_cache").is_some());
    assert!(json["checks"].get("durable_cache").is_some());
}

#[tokio::test]
async fn test_offline_is_still_healthy() {
    let app = TestApp::new();
    app.probe.set_reachable(false);

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["network"]["state"], "offline");
}

#[tokio::test]
async fn test_unwritable_durable_tier_is_degraded() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let app = TestApp::with_options(TestOptions {
        durable_dir: Some(blocker.path().join("api")),
        ..TestOptions::default()
    });

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["durable_cache"]["status"], "error");
}
