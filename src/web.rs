//! Axum-based HTTP API with optional OpenAPI (utoipa) and Swagger UI

use crate::config::Config;
use crate::coordinator::CoordinatorHandle;
use crate::sensor::SensorRegistry;
use crate::views;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: CoordinatorHandle,
    pub sensors: SensorRegistry,
    pub config: Arc<Config>,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
)))]
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/version", responses((status = 200))))]
async fn version() -> impl IntoResponse {
    Json(serde_json::json!({ "version": env!("APP_VERSION") }))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/prices", responses(
    (status = 200, description = "Today's and tomorrow's prices", body = crate::views::ProcessedData),
    (status = 503, description = "No valid price data")
)))]
async fn prices(State(state): State<AppState>) -> impl IntoResponse {
    // Expired or unauthorized data stays cached but must not be served
    let data = state
        .coordinator
        .processed_data()
        .filter(|_| state.coordinator.is_available());
    match data {
        Some(data) => (StatusCode::OK, Json(serde_json::to_value(data).unwrap_or_default())),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": "no price data available"})),
        ),
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/sensors", responses((status = 200))))]
async fn sensors(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.sensors.read().await;
    Json(registry.values().cloned().collect::<Vec<_>>())
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/sensors/{entity_id}",
    params(("entity_id" = String, Path, description = "Entity id, e.g. entsoe.prices_today")),
    responses((status = 200), (status = 404))))]
async fn sensor_by_id(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> impl IntoResponse {
    let registry = state.sensors.read().await;
    match registry.get(&entity_id) {
        Some(sensor) => (
            StatusCode::OK,
            Json(serde_json::to_value(sensor).unwrap_or_default()),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "unknown entity"})),
        ),
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/status", responses(
    (status = 200, description = "Coordinator update status", body = crate::coordinator::UpdateStatus)
)))]
async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.coordinator.status();
    let mut root = serde_json::to_value(&status).unwrap_or_default();
    root["available"] = serde_json::json!(state.coordinator.is_available());
    root["area"] = serde_json::json!(state.config.entsoe.area);
    if let Some(snapshot) = state.coordinator.snapshot() {
        root["origin"] = serde_json::json!(snapshot.origin);
        root["fetched_at"] = serde_json::json!(snapshot.fetched_at);
        root["newest_start"] = serde_json::json!(snapshot.all.newest_start());
    }
    Json(root)
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/refresh", responses(
    (status = 202, description = "Refresh queued"),
    (status = 503, description = "Coordinator not running")
)))]
async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.request_refresh() {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"status": "accepted"})),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": e.to_string()})),
        ),
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/config", responses((status = 200))))]
async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(
        serde_json::to_value(state.config.redacted())
            .unwrap_or(serde_json::json!({"error":"serialization"})),
    )
}

#[cfg(feature = "openapi")]
#[utoipa::path(get, path = "/api/config/schema", responses((status = 200)))]
async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error":"schema"})))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/events", responses((status = 200))))]
async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let handle = state.coordinator;
    let snapshots = WatchStream::new(handle.subscribe_snapshot()).map(|_| ());
    let statuses = WatchStream::new(handle.subscribe_status()).map(|_| ());
    let stream = snapshots.merge(statuses).map(move |()| {
        let event = match handle.snapshot().filter(|_| handle.is_available()) {
            Some(snapshot) => {
                let data = views::processed_data(&snapshot, handle.timezone(), Utc::now());
                Event::default()
                    .event("prices")
                    .data(serde_json::to_string(&data).unwrap_or_default())
            }
            None => Event::default().event("unavailable").data("{}"),
        };
        Ok::<Event, std::convert::Infallible>(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        health, version, prices, sensors, sensor_by_id, status, refresh,
        get_config, get_config_schema, events,
    ),
    components(schemas(
        crate::views::ProcessedData,
        crate::views::TimedPrice,
        crate::coordinator::UpdateStatus,
        crate::coordinator::RefreshOutcome,
    )),
    tags((name = "entsoe", description = "ENTSO-e day-ahead price API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api/version", get(version))
        .route("/api/prices", get(prices))
        .route("/api/sensors", get(sensors))
        .route("/api/sensors/{entity_id}", get(sensor_by_id))
        .route("/api/status", get(status))
        .route("/api/refresh", post(refresh))
        .route("/api/config", get(get_config))
        .route("/api/events", get(events));

    #[cfg(feature = "openapi")]
    let router = {
        use utoipa::OpenApi;
        router
            .route("/api/config/schema", get(get_config_schema))
            .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
    };

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(state);

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let addr: SocketAddr = if let Ok(ip) = host.parse::<IpAddr>() {
        SocketAddr::new(ip, port)
    } else {
        logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
        ([127, 0, 0, 1], port).into()
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
