#![cfg(feature = "web")]

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use common::{ScriptedSource, coordinator, hourly, local_midnight, morning, today_midnight};
use entsoe::config::Config;
use entsoe::coordinator::Coordinator;
use entsoe::error::EntsoeError;
use entsoe::web::{AppState, build_router};
use http_body_util::BodyExt;
use tokio::sync::RwLock;
use tower::ServiceExt;

fn app(coordinator: &Coordinator) -> axum::Router {
    let mut config = Config::default();
    config.entsoe.api_key = "super-secret".to_string();
    build_router(AppState {
        coordinator: coordinator.handle(),
        sensors: Arc::new(RwLock::new(BTreeMap::new())),
        config: Arc::new(config),
    })
}

async fn call(app: axum::Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_ok() {
    let coordinator = coordinator(ScriptedSource::new());
    let (status, _) = call(app(&coordinator), "GET", "/api/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn prices_unavailable_until_primed() {
    let coordinator = coordinator(ScriptedSource::new());
    let (status, body) = call(app(&coordinator), "GET", "/api/prices").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "no price data available");

    let midnight = today_midnight();
    coordinator.restore(
        &hourly(midnight, 24, |_| 3.0),
        &hourly(midnight + Duration::days(1), 24, |_| 4.0),
    );
    let (status, body) = call(app(&coordinator), "GET", "/api/prices").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["prices_today"].as_array().unwrap().is_empty());
    assert!(body["time_tomorrow"].is_string());

    let (_, body) = call(app(&coordinator), "GET", "/api/status").await;
    assert_eq!(body["available"], true);
    assert_eq!(body["origin"], "restored");
    assert_eq!(body["area"], "NL");
}

#[tokio::test]
async fn unknown_sensor_is_404() {
    let coordinator = coordinator(ScriptedSource::new());
    let (status, body) = call(app(&coordinator), "GET", "/api/sensors/entsoe.nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown entity");
}

#[tokio::test]
async fn refresh_is_accepted_while_coordinator_exists() {
    let coordinator = coordinator(ScriptedSource::new());
    let (status, body) = call(app(&coordinator), "POST", "/api/refresh").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn config_hides_api_key() {
    let coordinator = coordinator(ScriptedSource::new());
    let (status, body) = call(app(&coordinator), "GET", "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entsoe"]["api_key"], "***");
}

async fn first_event(app: axum::Router) -> String {
    let resp = app
        .oneshot(Request::builder().uri("/api/events").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let frame = resp.into_body().frame().await.unwrap().unwrap();
    String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap()
}

#[tokio::test]
async fn expired_prices_are_not_served() {
    let source = ScriptedSource::new();
    source.push_ok(hourly(local_midnight(), 24, |_| 90.0));
    source.push_err(EntsoeError::transport("connection reset"));
    let coordinator = coordinator(source);

    coordinator.refresh_at(morning()).await.unwrap();
    let newest = coordinator.snapshot().unwrap().all.newest_start().unwrap();
    let err = coordinator
        .refresh_at(newest.with_timezone(&chrono::Utc))
        .await
        .unwrap_err();
    assert!(matches!(err, EntsoeError::StaleDataExpired { .. }));
    // The expired snapshot is still cached
    assert!(coordinator.snapshot().is_some());

    let (status, body) = call(app(&coordinator), "GET", "/api/prices").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "no price data available");

    let event = first_event(app(&coordinator)).await;
    assert!(event.contains("event: unavailable"));
}

#[tokio::test]
async fn prices_withheld_after_auth_failure() {
    let source = ScriptedSource::new();
    let midnight = today_midnight();
    source.push_ok(hourly(midnight - Duration::days(1), 96, |_| 90.0));
    source.push_err(EntsoeError::auth("Unauthorized: please check your API key"));
    let coordinator = coordinator(source);

    coordinator.refresh().await.unwrap();
    assert!(first_event(app(&coordinator)).await.contains("event: prices"));
    let (status, _) = call(app(&coordinator), "GET", "/api/prices").await;
    assert_eq!(status, StatusCode::OK);

    coordinator.refresh().await.unwrap_err();
    let (status, _) = call(app(&coordinator), "GET", "/api/prices").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(first_event(app(&coordinator)).await.contains("event: unavailable"));
}

#[tokio::test]
async fn version_reports_package_version() {
    let coordinator = coordinator(ScriptedSource::new());
    let (status, body) = call(app(&coordinator), "GET", "/api/version").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["version"]
            .as_str()
            .unwrap()
            .starts_with(env!("CARGO_PKG_VERSION"))
    );
}
