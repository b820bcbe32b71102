//! Health and metrics routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelStatus,
    pub cooldown_store: String,
}

/// Threshold model status
#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub path: Option<String>,
    pub targets: Vec<String>,
}

/// Health check handler
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let model = match state.pipeline.model_info() {
        Some(info) => ModelStatus {
            loaded: true,
            path: Some(info.path),
            targets: info.targets,
        },
        None => ModelStatus {
            loaded: false,
            path: None,
            targets: Vec::new(),
        },
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model,
        cooldown_store: state.pipeline.store().backend_name().to_string(),
    })
}

/// Prometheus exposition
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed".to_string()),
    }
}
