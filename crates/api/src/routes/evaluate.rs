//! Evaluation routes

use axum::{extract::State, Json};
use chrono::Utc;
use field_model::{AlertOutput, Situation, ThresholdSet};
use pipeline::{CycleInput, CycleOutcome};
use std::sync::Arc;
use tracing::debug;

use crate::{ApiError, AppState};

/// Run one evaluation cycle on the posted inputs
pub async fn post_evaluate(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CycleInput>,
) -> Result<Json<AlertOutput>, ApiError> {
    debug!("Evaluate request for {}", input.situation.subject_id);
    metrics::counter!("fieldwatch_api_requests_total", "route" => "evaluate").increment(1);

    match state.pipeline.run_cycle(input, Utc::now()).await? {
        CycleOutcome::Completed(output) => Ok(Json(output)),
        CycleOutcome::Superseded => Err(ApiError::Superseded),
    }
}

/// Derive thresholds for a situation
pub async fn post_thresholds(
    State(state): State<Arc<AppState>>,
    Json(situation): Json<Situation>,
) -> Json<ThresholdSet> {
    metrics::counter!("fieldwatch_api_requests_total", "route" => "thresholds").increment(1);
    Json(state.pipeline.thresholds(&situation).await)
}
