use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::errors::PredictionError;
use crate::schedule::SessionType;
use crate::scoring::{RankedPicks, ScoringBreakdown, TOP_TEN_SLOTS};

/// One user's forecast for one session of a race weekend.
///
/// `points` doubles as the scored marker: while it is None the prediction
/// is outstanding and may still be picked up by the scoring job; once set
/// it is never scored again unless explicitly reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub user_id: String,
    pub race_id: String,
    pub session_type: SessionType,
    /// Predicted finishing order; empty strings mark unfilled slots.
    pub top_ten: Vec<String>,
    pub pole_pick: Option<String>,
    pub fastest_lap_pick: Option<String>,
    pub points: Option<i32>,
    pub breakdown: Option<ScoringBreakdown>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prediction {
    pub fn is_scored(&self) -> bool {
        self.points.is_some()
    }

    pub fn picks(&self) -> RankedPicks<'_> {
        RankedPicks {
            top_ten: &self.top_ten,
            pole_pick: self.pole_pick.as_deref(),
            fastest_lap_pick: self.fastest_lap_pick.as_deref(),
        }
    }
}

/// The mutable fields of a prediction as submitted by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionDraft {
    pub user_id: String,
    pub race_id: String,
    pub session_type: SessionType,
    pub top_ten: Vec<String>,
    pub pole_pick: Option<String>,
    pub fastest_lap_pick: Option<String>,
}

impl PredictionDraft {
    /// Exactly ten slots, filled entries distinct. Empty slots are allowed
    /// (the scorer treats them as guaranteed misses).
    pub fn validate(&self) -> Result<(), PredictionError> {
        if self.top_ten.len() != TOP_TEN_SLOTS {
            return Err(PredictionError::Validation(format!(
                "expected {TOP_TEN_SLOTS} prediction slots, got {}",
                self.top_ten.len()
            )));
        }

        let mut seen = HashSet::new();
        for driver in self.top_ten.iter().filter(|d| !d.is_empty()) {
            if !seen.insert(driver.as_str()) {
                return Err(PredictionError::Validation(format!(
                    "driver {driver} appears more than once"
                )));
            }
        }

        Ok(())
    }
}
