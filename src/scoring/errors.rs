use thiserror::Error;

use crate::schedule::SessionType;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Result payload cannot be parsed. Fatal for that session's job only.
    #[error("Malformed results payload: {0}")]
    MalformedResults(String),

    #[error("No completed results available for {race_id} {session_type}")]
    ResultsUnavailable {
        race_id: String,
        session_type: SessionType,
    },

    #[error("Job store error: {0}")]
    JobStore(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<crate::prediction::PredictionError> for ScoringError {
    fn from(err: crate::prediction::PredictionError) -> Self {
        ScoringError::Repository(err.to_string())
    }
}
