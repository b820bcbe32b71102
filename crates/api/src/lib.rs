//! FieldWatch API Server
//!
//! REST endpoints for on-demand evaluation cycles, threshold inspection,
//! health and Prometheus metrics.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pipeline::{ConfigError, EngineConfig, LogFormat, LoggingConfig, Pipeline, PipelineError};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use storage::AnyCooldownStore;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod routes;

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: Pipeline<AnyCooldownStore>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(pipeline: Pipeline<AnyCooldownStore>) -> Self {
        Self {
            pipeline,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Handler errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("A newer evaluation for this subject is in progress")]
    Superseded,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Superseded => StatusCode::CONFLICT,
            ApiError::Pipeline(PipelineError::Cooldown(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Pipeline(PipelineError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Pipeline(PipelineError::Lock(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Server startup errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Metrics exporter: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(routes::health::get_health))
        .route("/api/v1/evaluate", post(routes::evaluate::post_evaluate))
        .route("/api/v1/thresholds", post(routes::evaluate::post_thresholds))
        .route("/metrics", get(routes::health::get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), SetGlobalDefaultError> {
    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    match config.format {
        LogFormat::Plain => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
}

fn spawn_purger(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = state.pipeline.purge_cooldowns(Utc::now()).await {
                warn!("Cooldown purge failed: {}", e);
            }
        }
    });
}

/// Run the server
pub async fn run_server(config: EngineConfig) -> Result<(), ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    let store = config.open_store().await?;
    info!("Cooldown store: {}", store.backend_name());
    let pipeline = Pipeline::new(&config, config.load_model(), store)?;
    let state = Arc::new(AppState::new(pipeline).with_metrics(handle));

    spawn_purger(
        Arc::clone(&state),
        Duration::from_secs(config.scheduler.purge_interval_secs),
    );
    let app = create_router(state);

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use pipeline::UpstreamError;
    use tower::ServiceExt;

    async fn app() -> Router {
        let store = AnyCooldownStore::open("memory", 1).await.unwrap();
        let pipeline = Pipeline::new(&EngineConfig::default(), None, store).unwrap();
        create_router(Arc::new(AppState::new(pipeline)))
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn situation() -> serde_json::Value {
        json!({
            "subject_id": "field-1",
            "location": { "latitude": 20.3, "longitude": 85.8 },
            "evaluation_date": "2026-04-14"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .await
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model"]["loaded"], false);
        assert_eq!(body["cooldown_store"], "memory");
    }

    #[tokio::test]
    async fn test_evaluate() {
        let request = post(
            "/api/v1/evaluate",
            json!({
                "situation": situation(),
                "current": {
                    "temperature": 39.0,
                    "max_temperature": 42.0,
                    "min_temperature": 28.0,
                    "condition": "clear",
                    "observed_at": "2026-04-14T06:00:00Z"
                }
            }),
        );
        let response = app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["risk_alerts"][0]["type"], "HEAT_STRESS");
        assert_eq!(body["weather_summary"]["condition"], "Clear skies");
        assert!(body["farming_actions"].as_array().is_some_and(|a| !a.is_empty()));
    }

    #[tokio::test]
    async fn test_thresholds() {
        let response = app()
            .await
            .oneshot(post("/api/v1/thresholds", situation()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["heat_stress_temp"]["value"], 35.0);
        assert_eq!(body["heat_stress_temp"]["source"], "BASE");
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let response = app()
            .await
            .oneshot(post("/api/v1/evaluate", json!({ "situation": "nope" })))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_metrics_without_exporter() {
        let response = app()
            .await
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::Superseded.into_response().status(), StatusCode::CONFLICT);
        let cooldown = ApiError::from(PipelineError::Cooldown(
            storage::StorageError::DatabaseError("locked".to_string()).into(),
        ));
        assert_eq!(cooldown.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        let upstream = ApiError::from(PipelineError::Upstream(UpstreamError::Unavailable(
            "down".to_string(),
        )));
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
