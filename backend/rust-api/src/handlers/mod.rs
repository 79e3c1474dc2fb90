use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::error::{ApiError, StoreError};
use crate::metrics;
use crate::services::AppState;
use crate::store::bounded;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "SquareYards ChatBot Backend API",
        "status": "running"
    }))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "Backend is running"
    }))
}

/// Single store ping bounded by the ping deadline. Never retried.
pub async fn ping_db(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    match bounded("store.ping", state.config.timeouts.ping(), state.probe.ping()).await {
        Ok(()) => {
            tracing::debug!("Store ping successful");
            Ok(Json(json!({ "message": "MongoDB connection is working" })))
        }
        Err(StoreError::Timeout { .. }) => {
            tracing::warn!("Store ping timed out");
            Err(ApiError::Unavailable(
                "DB ping timed out - connection issues".to_string(),
            ))
        }
        Err(e) => {
            tracing::warn!("Store ping failed: {}", e);
            Err(ApiError::Unavailable(format!("DB ping failed: {}", e)))
        }
    }
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

pub mod chat;
pub mod leads;
pub mod otp;
pub mod quiz;
