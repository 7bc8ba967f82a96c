use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::{info, instrument};

use super::job::ScoringJob;
use super::runner::{BatchReport, SessionReport};
use crate::schedule::SessionType;
use crate::shared::{AppError, AppState};

/// On-demand trigger for the scoring batch; the periodic poll task calls
/// the same runner.
#[instrument(skip_all)]
pub async fn run_scoring(State(state): State<AppState>) -> Result<Json<BatchReport>, AppError> {
    let report = state.job_runner.run_batch().await?;
    info!(processed = report.processed, "On-demand scoring run finished");
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct RescoreRequest {
    pub race_id: String,
    pub session_type: SessionType,
}

/// Operator-triggered re-score for one session.
#[instrument(skip_all, fields(race_id = %request.race_id))]
pub async fn rescore_session(
    State(state): State<AppState>,
    Json(request): Json<RescoreRequest>,
) -> Result<Json<SessionReport>, AppError> {
    let report = state
        .job_runner
        .rescore(&request.race_id, request.session_type)
        .await?;
    Ok(Json(report))
}

/// Job listing for cron-status monitoring.
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<ScoringJob>>, AppError> {
    let jobs = state.job_store.list().await?;
    Ok(Json(jobs))
}
