//! HTTP API for health checks, Prometheus metrics and resource views

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use scheduler_lib::{
    health::HealthRegistry,
    observability::SchedulerMetrics,
    Orchestrator,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Default forecast horizon for `/predictions`
const DEFAULT_HORIZON_MINUTES: u32 = 60;

/// Longest horizon accepted by `/predictions` (one week)
const MAX_HORIZON_MINUTES: u32 = 7 * 24 * 60;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: SchedulerMetrics,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: SchedulerMetrics,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            orchestrator,
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = if health.status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            e.to_string().into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Latest recorded resource sample, 404 before the first one
async fn resources(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.orchestrator.monitor().latest().await {
        Some(sample) => (StatusCode::OK, Json(serde_json::json!(sample))),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no resource samples recorded yet" })),
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictionQuery {
    pub horizon: Option<u32>,
}

/// Forecast for `?horizon=` minutes ahead
async fn predictions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PredictionQuery>,
) -> impl IntoResponse {
    let horizon = query.horizon.unwrap_or(DEFAULT_HORIZON_MINUTES);
    if horizon == 0 || horizon > MAX_HORIZON_MINUTES {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!("horizon must be between 1 and {} minutes", MAX_HORIZON_MINUTES)
            })),
        );
    }

    let outcome = state.orchestrator.predict_resource_needs(horizon).await;
    (StatusCode::OK, Json(serde_json::json!(outcome)))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/resources", get(resources))
        .route("/predictions", get(predictions))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
