use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::Prediction;
use crate::schedule::SessionType;
use crate::scoring::ScoringBreakdown;

/// Request payload for creating or updating a prediction
#[derive(Debug, Deserialize)]
pub struct PredictionUpsertRequest {
    pub user_id: String,
    pub session_type: SessionType,
    pub top_ten: Vec<String>,
    pub pole_pick: Option<String>,
    pub fastest_lap_pick: Option<String>,
}

/// Query parameters identifying one user's prediction for a race
#[derive(Debug, Deserialize)]
pub struct PredictionQuery {
    pub user_id: String,
    pub session_type: SessionType,
}

/// Response for prediction reads and writes
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub id: Uuid,
    pub user_id: String,
    pub race_id: String,
    pub session_type: SessionType,
    pub top_ten: Vec<String>,
    pub pole_pick: Option<String>,
    pub fastest_lap_pick: Option<String>,
    pub points: Option<i32>,
    pub breakdown: Option<ScoringBreakdown>,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            id: prediction.id,
            user_id: prediction.user_id,
            race_id: prediction.race_id,
            session_type: prediction.session_type,
            top_ten: prediction.top_ten,
            pole_pick: prediction.pole_pick,
            fastest_lap_pick: prediction.fastest_lap_pick,
            points: prediction.points,
            breakdown: prediction.breakdown,
        }
    }
}
