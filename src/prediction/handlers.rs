use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;

use super::models::PredictionDraft;
use super::types::{PredictionQuery, PredictionResponse, PredictionUpsertRequest};
use crate::shared::{AppError, AppState};

#[instrument(skip_all, fields(race_id = %race_id))]
pub async fn upsert_prediction(
    State(state): State<AppState>,
    Path(race_id): Path<String>,
    Json(request): Json<PredictionUpsertRequest>,
) -> Result<Json<PredictionResponse>, AppError> {
    let prediction = state
        .prediction_service
        .upsert(PredictionDraft {
            user_id: request.user_id,
            race_id,
            session_type: request.session_type,
            top_ten: request.top_ten,
            pole_pick: request.pole_pick,
            fastest_lap_pick: request.fastest_lap_pick,
        })
        .await?;

    Ok(Json(prediction.into()))
}

#[instrument(skip_all, fields(race_id = %race_id))]
pub async fn get_prediction(
    State(state): State<AppState>,
    Path(race_id): Path<String>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<PredictionResponse>, AppError> {
    let prediction = state
        .prediction_service
        .get(&query.user_id, &race_id, query.session_type)
        .await?
        .ok_or_else(|| AppError::NotFound("Prediction not found".to_string()))?;

    Ok(Json(prediction.into()))
}

#[instrument(skip_all, fields(race_id = %race_id))]
pub async fn delete_prediction(
    State(state): State<AppState>,
    Path(race_id): Path<String>,
    Query(query): Query<PredictionQuery>,
) -> Result<(), AppError> {
    let prediction = state
        .prediction_service
        .get(&query.user_id, &race_id, query.session_type)
        .await?
        .ok_or_else(|| AppError::NotFound("Prediction not found".to_string()))?;

    state
        .prediction_service
        .delete(prediction.id, &query.user_id, &race_id)
        .await?;

    Ok(())
}
