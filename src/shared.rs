use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::prediction::{PredictionError, PredictionService};
use crate::scoring::{ScoringError, ScoringJobRunner, ScoringJobStore};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub prediction_service: Arc<PredictionService>,
    pub job_runner: Arc<ScoringJobRunner>,
    pub job_store: Arc<dyn ScoringJobStore>,
}

impl AppState {
    pub fn new(
        prediction_service: Arc<PredictionService>,
        job_runner: Arc<ScoringJobRunner>,
        job_store: Arc<dyn ScoringJobStore>,
    ) -> Self {
        Self {
            prediction_service,
            job_runner,
            job_store,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Lock violations get their own status so the UI can show a
    /// lock-specific message instead of a generic failure.
    #[error("Locked: {0}")]
    Locked(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Locked(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<PredictionError> for AppError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::Locked { .. } => AppError::Locked(err.to_string()),
            PredictionError::NotFound => AppError::NotFound(err.to_string()),
            PredictionError::Validation(msg) => AppError::Validation(msg),
            PredictionError::Repository(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::ResultsUnavailable { .. } => AppError::NotFound(err.to_string()),
            ScoringError::MalformedResults(msg) => AppError::Validation(msg),
            ScoringError::JobStore(msg) | ScoringError::Repository(msg) => {
                AppError::DatabaseError(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_maps_to_conflict() {
        let err: AppError = PredictionError::Locked {
            race_id: "monaco-2025".to_string(),
            lock_boundary: None,
        }
        .into();

        assert!(matches!(err, AppError::Locked(_)));
    }

    #[test]
    fn not_found_and_validation_stay_distinct_from_locked() {
        assert!(matches!(
            AppError::from(PredictionError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(PredictionError::Validation("bad".to_string())),
            AppError::Validation(_)
        ));
    }
}
