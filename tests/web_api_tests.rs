//! Integration tests for the web API.
//!
//! These tests drive the axum router over a real `SharedGate` with a mock
//! stepper and check the exact wire format.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use barn_gate::config::DoorConfig;
use barn_gate::hal::MockStepper;
use barn_gate::registry::HERD;
use barn_gate::services::{build_router, GateStatus, SharedGate, WebServerConfig};
use barn_gate::{AccessEvent, ChannelRole, DoorController, DoorState};

type Gate = Arc<SharedGate<MockStepper>>;

fn create_test_app(cors: bool) -> (axum::Router, Gate) {
    let stepper = MockStepper::new().with_steps_per_run(2000);
    let door = DoorController::new(stepper, DoorConfig::default()).unwrap();
    let gate = Arc::new(SharedGate::new(door));
    let config = WebServerConfig::default().cors(cors);
    let router = build_router(Arc::clone(&gate), &config);
    (router, gate)
}

fn entry(index: usize) -> AccessEvent {
    AccessEvent {
        role: ChannelRole::Entry,
        id: HERD[index].id,
        name: HERD[index].name,
    }
}

async fn send(app: &axum::Router, method: &str, uri: &str) -> (StatusCode, String) {
    let (status, _, body) = send_typed(app, method, uri).await;
    (status, body)
}

/// Like `send`, also returning the `Content-Type` header.
async fn send_typed(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, String, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| value.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_get_barn_empty() {
    let (app, _gate) = create_test_app(false);

    let (status, content_type, body) = send_typed(&app, "GET", "/api/barn").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/json");
    assert_eq!(body, r#"{"count":0,"doorStatus":"closed","goats":[]}"#);
}

#[tokio::test]
async fn test_get_barn_after_entry() {
    let (app, gate) = create_test_app(false);
    gate.apply_event(&entry(0), 0).unwrap();

    let (status, content_type, body) = send_typed(&app, "GET", "/api/barn").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/json");
    assert_eq!(body, r#"{"count":1,"doorStatus":"opening","goats":["Bron"]}"#);
}

#[tokio::test]
async fn test_get_barn_lists_in_entry_order() {
    let (app, gate) = create_test_app(false);
    gate.apply_event(&entry(1), 0).unwrap();
    gate.apply_event(&entry(0), 1).unwrap();

    let (_, body) = send(&app, "GET", "/api/barn").await;
    let status: GateStatus = serde_json::from_str(&body).unwrap();

    assert_eq!(status.count, 2);
    assert_eq!(status.goats, ["TFrance", "Bron"]);
}

#[tokio::test]
async fn test_manual_open() {
    let (app, gate) = create_test_app(false);

    let (status, content_type, body) = send_typed(&app, "POST", "/api/door/open").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain"), "{content_type}");
    assert_eq!(body, "OK");
    let door = gate.door_status();
    assert_eq!(door.state, DoorState::Opening);
    assert!(door.manual);

    gate.update_door(1).unwrap();
    assert_eq!(gate.door_status().state, DoorState::ManualOpen);
    let (_, body) = send(&app, "GET", "/api/barn").await;
    assert_eq!(body, r#"{"count":0,"doorStatus":"manual_open","goats":[]}"#);
}

#[tokio::test]
async fn test_manual_close_from_manual_open() {
    let (app, gate) = create_test_app(false);
    send(&app, "POST", "/api/door/open").await;
    gate.update_door(1).unwrap();

    let (status, content_type, body) = send_typed(&app, "POST", "/api/door/close").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain"), "{content_type}");
    assert_eq!(body, "OK");
    assert_eq!(gate.door_status().state, DoorState::Closing);
    assert!(!gate.door_status().manual);
}

#[tokio::test]
async fn test_open_while_closing_is_ok_but_ignored() {
    let (app, gate) = create_test_app(false);
    gate.apply_event(&entry(0), 0).unwrap();
    gate.update_door(0).unwrap();
    assert_eq!(gate.door_status().state, DoorState::OpenHolding);
    gate.update_door(3_000).unwrap();
    assert_eq!(gate.door_status().state, DoorState::Closing);

    let (status, body) = send(&app, "POST", "/api/door/open").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(gate.door_status().state, DoorState::Closing);
    assert_eq!(gate.door_status().stats.moves, 1);
}

#[tokio::test]
async fn test_close_when_closed_is_ok() {
    let (app, gate) = create_test_app(false);

    let (status, content_type, body) = send_typed(&app, "POST", "/api/door/close").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain"), "{content_type}");
    assert_eq!(body, "OK");
    assert_eq!(gate.door_status().state, DoorState::Idle);
}

#[tokio::test]
async fn test_index_serves_html() {
    let (app, _gate) = create_test_app(false);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("/api/barn"));
    assert!(html.contains("/api/door/open"));
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let (app, _gate) = create_test_app(false);

    let (status, body) = send(&app, "GET", "/api/goats").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not found");
}

#[tokio::test]
async fn test_cors_headers_when_permissive() {
    let (app, _gate) = create_test_app(true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/barn")
                .header(header::ORIGIN, "http://192.168.4.2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_no_cors_headers_when_disabled() {
    let (app, _gate) = create_test_app(false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/barn")
                .header(header::ORIGIN, "http://192.168.4.2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
