use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictionError {
    /// Mutation attempted at or after the lock boundary. Surfaced as its
    /// own condition so the UI can render a lock-specific message instead
    /// of a generic failure.
    #[error("Predictions for race {race_id} are locked")]
    Locked {
        race_id: String,
        lock_boundary: Option<DateTime<Utc>>,
    },

    #[error("Prediction not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(String),
}
