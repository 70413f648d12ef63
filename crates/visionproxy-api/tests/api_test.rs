mod helpers;

use axum::http::StatusCode;
use serde_json::{json, Value};

use helpers::setup_test_server;

#[tokio::test]
async fn health_returns_ok() {
    let server = setup_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("ok");
}

#[tokio::test]
async fn check_requires_video_id() {
    let server = setup_test_server();

    let response = server.get("/check").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn check_rejects_malformed_video_id() {
    let server = setup_test_server();

    let response = server
        .get("/check")
        .add_query_param("id", "abc/../def")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn check_rejects_unsupported_platform() {
    let server = setup_test_server();

    let response = server
        .get("/check")
        .add_query_param("id", "dQw4w9WgXcQ")
        .add_query_param("platform", "vimeo")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("vimeo"));
}

#[tokio::test]
async fn add_rejects_inverted_range() {
    let server = setup_test_server();

    let response = server
        .post("/add")
        .json(&json!({
            "video_id": "dQw4w9WgXcQ",
            "blockers": [
                { "start_time_ms": 1000, "end_time_ms": 9000 },
                { "start_time_ms": 5000, "end_time_ms": 5000 }
            ]
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn add_rejects_malformed_body() {
    let server = setup_test_server();

    let response = server
        .post("/add")
        .json(&json!({ "video_id": "dQw4w9WgXcQ", "blockers": "none" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn generate_rejects_empty_video_id() {
    let server = setup_test_server();

    let response = server
        .post("/generate-descriptions")
        .json(&json!({ "video_id": "  " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_requires_post() {
    let server = setup_test_server();

    let response = server.get("/generate-descriptions").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
