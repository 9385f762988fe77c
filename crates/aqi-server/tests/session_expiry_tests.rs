//! Idle session reclamation and the active-sessions gauge
//!
//! Kept in its own test binary: the gauge is process-global.

use aqi_lib::{
    health::HealthRegistry, model::LinearModel, AqiMetrics, ModelHandle, ModelRegistry,
    StructuredLogger,
};
use aqi_server::api::{create_router, AppState};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_idle_sessions_evicted_and_gauge_follows() {
    let metrics = AqiMetrics::new();
    let handle = ModelHandle::from_model(LinearModel::constant(75.0), "test-model");
    let state = Arc::new(
        AppState::new(
            HealthRegistry::new(),
            metrics.clone(),
            StructuredLogger::new("test"),
            Arc::new(ModelRegistry::from_handle(handle)),
        )
        .with_session_idle(Duration::from_secs(60)),
    );
    let app = create_router(state.clone());

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (status, body) = send(&app, Method::POST, "/sessions").await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["session_id"].as_str().unwrap().to_string());
    }
    assert_eq!(metrics.active_sessions(), 3);

    tokio::time::advance(Duration::from_secs(30)).await;
    let (status, _) = send(&app, Method::GET, &format!("/sessions/{}", ids[0])).await;
    assert_eq!(status, StatusCode::OK);
    tokio::time::advance(Duration::from_secs(40)).await;

    assert_eq!(state.evict_idle_sessions(), 2);
    assert_eq!(state.sessions.len(), 1);
    assert_eq!(metrics.active_sessions(), 1);

    let (status, body) = send(&app, Method::GET, &format!("/sessions/{}", ids[1])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_session");

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(state.evict_idle_sessions(), 1);
    assert!(state.sessions.is_empty());
    assert_eq!(metrics.active_sessions(), 0);
}
