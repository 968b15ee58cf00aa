//! Liveness and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failing: Vec<String>,
}

/// GET /healthz
pub async fn liveness() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        failing: Vec::new(),
    })
}

/// GET /ready - 503 naming every dependency that failed its check
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let mut failing = Vec::new();
    for check in state.readiness.iter() {
        if let Err(e) = check.check().await {
            tracing::warn!(dependency = check.name(), error = %e, "readiness check failed");
            failing.push(check.name().to_string());
        }
    }

    if failing.is_empty() {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready".to_string(),
                failing,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
                failing,
            }),
        )
    }
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(liveness))
        .route("/ready", get(readiness))
}
