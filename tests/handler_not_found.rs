mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = TestApp::new();

    let response = app.server.get("/nowhere").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["error"]["details"]["path"], "/nowhere");
}

#[tokio::test]
async fn test_unknown_route_does_not_touch_network_state() {
    let app = TestApp::new();

    let response = app.server.get("/nowhere").await;

    assert_eq!(response.header("x-network-status"), "online");
    assert!(response.maybe_header("x-served-from-cache").is_none());
    assert!(app.state.network.state().is_online());
    assert_eq!(app.upstream.calls(), 0);
}
