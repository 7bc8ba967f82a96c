use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

use super::errors::ScoringError;
use super::points::TOP_TEN_SLOTS;
use crate::schedule::SessionType;

/// Official outcome of one completed session. Immutable input to scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceResults {
    /// Finishing order, best-known prefix of up to ten drivers.
    pub positions: Vec<String>,
    pub pole: Option<String>,
    pub fastest_lap: Option<String>,
}

impl RaceResults {
    /// Parses the raw upstream payload. Parsed once per session, never once
    /// per prediction; any failure here is fatal for that session's job.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, ScoringError> {
        let parsed: ResultsPayload = serde_json::from_value(payload.clone())
            .map_err(|e| ScoringError::MalformedResults(e.to_string()))?;

        if parsed.positions.iter().any(|driver| driver.is_empty()) {
            return Err(ScoringError::MalformedResults(
                "empty driver reference in finishing order".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for driver in &parsed.positions {
            if !seen.insert(driver.as_str()) {
                return Err(ScoringError::MalformedResults(format!(
                    "driver {driver} appears twice in finishing order"
                )));
            }
        }

        let mut positions = parsed.positions;
        positions.truncate(TOP_TEN_SLOTS);

        Ok(Self {
            positions,
            pole: parsed.pole.filter(|d| !d.is_empty()),
            fastest_lap: parsed.fastest_lap.filter(|d| !d.is_empty()),
        })
    }

    /// 1-based finishing position of a driver within the scored top ten.
    pub fn finishing_position(&self, driver: &str) -> Option<usize> {
        self.positions.iter().position(|d| d == driver).map(|i| i + 1)
    }
}

#[derive(Debug, Deserialize)]
struct ResultsPayload {
    positions: Vec<String>,
    #[serde(default)]
    pole: Option<String>,
    #[serde(default, alias = "fastestLap")]
    fastest_lap: Option<String>,
}

/// A completed session with its raw result payload, as discovered upstream.
#[derive(Debug, Clone)]
pub struct CompletedSession {
    pub race_id: String,
    pub session_type: SessionType,
    pub payload: serde_json::Value,
}

/// External collaborator that surfaces sessions marked complete together
/// with their official result payloads.
#[async_trait]
pub trait ResultsSource: Send + Sync {
    async fn get_completed_sessions(&self) -> Result<Vec<CompletedSession>, ScoringError>;
}

/// In-memory results source for development and testing
#[derive(Default)]
pub struct InMemoryResultsSource {
    sessions: Mutex<Vec<CompletedSession>>,
}

impl InMemoryResultsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_completed(
        &self,
        race_id: &str,
        session_type: SessionType,
        payload: serde_json::Value,
    ) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|s| !(s.race_id == race_id && s.session_type == session_type));
        sessions.push(CompletedSession {
            race_id: race_id.to_string(),
            session_type,
            payload,
        });
        debug!(race_id = %race_id, session_type = %session_type, "Session marked completed");
    }
}

#[async_trait]
impl ResultsSource for InMemoryResultsSource {
    async fn get_completed_sessions(&self) -> Result<Vec<CompletedSession>, ScoringError> {
        Ok(self.sessions.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_full_payload() {
        let payload = json!({
            "positions": ["VER", "NOR", "LEC"],
            "pole": "VER",
            "fastestLap": "NOR",
        });

        let results = RaceResults::from_payload(&payload).unwrap();

        assert_eq!(results.positions.len(), 3);
        assert_eq!(results.pole.as_deref(), Some("VER"));
        assert_eq!(results.fastest_lap.as_deref(), Some("NOR"));
        assert_eq!(results.finishing_position("LEC"), Some(3));
        assert_eq!(results.finishing_position("HAM"), None);
    }

    #[test]
    fn missing_bonus_fields_parse_as_none() {
        let payload = json!({ "positions": ["VER"] });

        let results = RaceResults::from_payload(&payload).unwrap();

        assert_eq!(results.pole, None);
        assert_eq!(results.fastest_lap, None);
    }

    #[test]
    fn truncates_to_the_scored_top_ten() {
        let positions: Vec<String> = (1..=20).map(|n| format!("D{n:02}")).collect();
        let payload = json!({ "positions": positions });

        let results = RaceResults::from_payload(&payload).unwrap();

        assert_eq!(results.positions.len(), TOP_TEN_SLOTS);
        assert_eq!(results.finishing_position("D10"), Some(10));
        assert_eq!(results.finishing_position("D11"), None);
    }

    #[test]
    fn rejects_a_payload_without_positions() {
        let payload = json!({ "pole": "VER" });

        let err = RaceResults::from_payload(&payload).unwrap_err();

        assert!(matches!(err, ScoringError::MalformedResults(_)));
    }

    #[test]
    fn rejects_duplicate_finishers() {
        let payload = json!({ "positions": ["VER", "NOR", "VER"] });

        let err = RaceResults::from_payload(&payload).unwrap_err();

        assert!(matches!(err, ScoringError::MalformedResults(_)));
    }
}
