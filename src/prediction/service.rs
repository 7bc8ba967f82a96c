use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::errors::PredictionError;
use super::models::{Prediction, PredictionDraft};
use super::repository::PredictionRepository;
use crate::schedule::{lock_decision, LockConfig, LockDecision, ScheduleSource, SessionType};

/// Gatekeeper for prediction mutations: every write re-computes the
/// weekend's LockDecision immediately before hitting the repository.
///
/// The public methods read the clock once at the edge; the `*_at`
/// variants take `now` explicitly so the lock behavior stays
/// deterministic in tests. Because locking is monotone, a decision
/// computed here can only be more permissive than one computed inside
/// the adapter a moment later, never less.
pub struct PredictionService {
    repository: Arc<dyn PredictionRepository>,
    schedules: Arc<dyn ScheduleSource>,
    lock_config: LockConfig,
}

impl PredictionService {
    pub fn new(
        repository: Arc<dyn PredictionRepository>,
        schedules: Arc<dyn ScheduleSource>,
        lock_config: LockConfig,
    ) -> Self {
        Self {
            repository,
            schedules,
            lock_config,
        }
    }

    pub async fn get(
        &self,
        user_id: &str,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Option<Prediction>, PredictionError> {
        self.repository.get(user_id, race_id, session_type).await
    }

    pub async fn upsert(&self, draft: PredictionDraft) -> Result<Prediction, PredictionError> {
        self.upsert_at(draft, Utc::now()).await
    }

    #[instrument(skip(self, draft), fields(race_id = %draft.race_id, user_id = %draft.user_id))]
    pub async fn upsert_at(
        &self,
        draft: PredictionDraft,
        now: DateTime<Utc>,
    ) -> Result<Prediction, PredictionError> {
        draft.validate()?;
        let lock = self.lock_for(&draft.race_id, now).await?;
        self.repository.upsert(draft, &lock).await
    }

    pub async fn delete(
        &self,
        prediction_id: Uuid,
        user_id: &str,
        race_id: &str,
    ) -> Result<(), PredictionError> {
        self.delete_at(prediction_id, user_id, race_id, Utc::now())
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_at(
        &self,
        prediction_id: Uuid,
        user_id: &str,
        race_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PredictionError> {
        let lock = self.lock_for(race_id, now).await?;
        self.repository.delete(prediction_id, user_id, &lock).await
    }

    /// A weekend without a loaded schedule (or without any governing
    /// session) stays open: a data-completeness problem upstream, not a
    /// reason to reject the user. Logged so operators notice.
    async fn lock_for(
        &self,
        race_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LockDecision, PredictionError> {
        let schedule = self
            .schedules
            .get_schedule(race_id)
            .await
            .map_err(|e| PredictionError::Repository(e.to_string()))?;

        let Some(schedule) = schedule else {
            warn!(race_id = %race_id, "No schedule loaded; predictions stay open");
            return Ok(LockDecision::open_indefinitely());
        };

        let decision = lock_decision(&schedule, now, &self.lock_config);
        if decision.governing_session.is_none() {
            warn!(race_id = %race_id, "Schedule has no governing session; predictions stay open");
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::repository::InMemoryPredictionRepository;
    use crate::schedule::{
        InMemoryScheduleSource, ScheduledSession, SessionKind, SessionSchedule,
    };
    use chrono::{Duration, TimeZone};

    fn quali_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 3, 15, 0, 0).unwrap()
    }

    fn service_with_schedule(schedule: Option<SessionSchedule>) -> PredictionService {
        let schedules = InMemoryScheduleSource::new();
        if let Some(schedule) = schedule {
            schedules.insert("monaco-2025", schedule);
        }
        PredictionService::new(
            Arc::new(InMemoryPredictionRepository::new()),
            Arc::new(schedules),
            LockConfig::default(),
        )
    }

    fn weekend_schedule() -> SessionSchedule {
        SessionSchedule::new(vec![
            ScheduledSession {
                kind: SessionKind::Qualifying,
                starts_at: quali_start(),
            },
            ScheduledSession {
                kind: SessionKind::Race,
                starts_at: quali_start() + Duration::days(1),
            },
        ])
    }

    fn draft() -> PredictionDraft {
        PredictionDraft {
            user_id: "alice".to_string(),
            race_id: "monaco-2025".to_string(),
            session_type: SessionType::Race,
            top_ten: ["VER", "NOR", "LEC", "PIA", "SAI", "HAM", "RUS", "ALO", "GAS", "STR"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            pole_pick: None,
            fastest_lap_pick: None,
        }
    }

    #[tokio::test]
    async fn upsert_before_the_boundary_succeeds() {
        let service = service_with_schedule(Some(weekend_schedule()));

        let prediction = service
            .upsert_at(draft(), quali_start() - Duration::hours(2))
            .await
            .unwrap();

        assert_eq!(prediction.user_id, "alice");
    }

    #[tokio::test]
    async fn upsert_at_the_boundary_is_locked() {
        let service = service_with_schedule(Some(weekend_schedule()));
        let boundary = quali_start() - Duration::minutes(15);

        let result = service.upsert_at(draft(), boundary).await;

        assert!(matches!(result, Err(PredictionError::Locked { .. })));
    }

    #[tokio::test]
    async fn delete_after_the_boundary_is_locked() {
        let service = service_with_schedule(Some(weekend_schedule()));
        let prediction = service
            .upsert_at(draft(), quali_start() - Duration::hours(2))
            .await
            .unwrap();

        let result = service
            .delete_at(
                prediction.id,
                "alice",
                "monaco-2025",
                quali_start() + Duration::hours(1),
            )
            .await;

        assert!(matches!(result, Err(PredictionError::Locked { .. })));
    }

    #[tokio::test]
    async fn invalid_draft_is_a_validation_error_not_a_lock_error() {
        let service = service_with_schedule(Some(weekend_schedule()));
        let mut bad = draft();
        bad.top_ten.truncate(3);

        let result = service
            .upsert_at(bad, quali_start() - Duration::hours(2))
            .await;

        assert!(matches!(result, Err(PredictionError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_schedule_keeps_predictions_open() {
        let service = service_with_schedule(None);

        let result = service
            .upsert_at(draft(), quali_start() + Duration::days(10))
            .await;

        assert!(result.is_ok());
    }
}
