//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::TimeZone;
use http_body_util::BodyExt;
use judgeboard_core::config::JudgingConfig;
use judgeboard_core::context::JudgingContext;
use judgeboard_test_support::{FixedClock, InMemoryJudgingStore, RecordingBroadcaster};
use tower::ServiceExt;
use uuid::Uuid;

use judgeboard_api::routes;
use judgeboard_api::state::AppState;

/// An app wired over in-memory capabilities the test can inspect.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryJudgingStore>,
    pub broadcaster: Arc<RecordingBroadcaster>,
}

impl TestApp {
    /// A fresh router over the shared state.
    pub fn router(&self) -> Router {
        routes::app(self.state.clone())
    }
}

/// Build the full app with an in-memory store and a fixed clock. Uses the
/// same route structure as `main.rs`.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(InMemoryJudgingStore::new());
    let broadcaster = Arc::new(RecordingBroadcaster::new());
    let clock = Arc::new(FixedClock(
        chrono::Utc.with_ymd_and_hms(2026, 5, 2, 10, 0, 0).unwrap(),
    ));
    let state = AppState::new(
        clock,
        store.clone(),
        store.clone(),
        broadcaster.clone(),
        JudgingConfig::default(),
    );
    TestApp {
        state,
        store,
        broadcaster,
    }
}

/// A fresh group/lift pair.
pub fn context() -> JudgingContext {
    JudgingContext::new(Uuid::new_v4(), Uuid::new_v4())
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
