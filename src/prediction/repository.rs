use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::errors::PredictionError;
use super::models::{Prediction, PredictionDraft};
use crate::schedule::{LockDecision, SessionType};
use crate::scoring::ScoringBreakdown;

/// Trait for prediction repository operations.
///
/// Mutations take the caller's LockDecision and reject with
/// `PredictionError::Locked` inside the adapter's own critical section, so
/// the lock check and the write are never two separate steps from the
/// store's perspective. `set_score` is scoped to "where points is
/// currently null", which is what makes the unscored→scored transition
/// at-most-once under concurrent runners.
#[async_trait]
pub trait PredictionRepository: Send + Sync {
    async fn get(
        &self,
        user_id: &str,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Option<Prediction>, PredictionError>;

    async fn upsert(
        &self,
        draft: PredictionDraft,
        lock: &LockDecision,
    ) -> Result<Prediction, PredictionError>;

    async fn delete(
        &self,
        prediction_id: Uuid,
        user_id: &str,
        lock: &LockDecision,
    ) -> Result<(), PredictionError>;

    async fn find_unscored(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Vec<Prediction>, PredictionError>;

    /// Persists points + breakdown only if the prediction is still
    /// unscored. Returns whether the write applied.
    async fn set_score(
        &self,
        prediction_id: Uuid,
        breakdown: &ScoringBreakdown,
    ) -> Result<bool, PredictionError>;

    /// Clears points + breakdown for a session's predictions so they can
    /// be re-scored. The only sanctioned re-score path.
    async fn reset_scores(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<u64, PredictionError>;

    /// Full scored history for one user, oldest first. Consumed by the
    /// badge evaluator.
    async fn find_scored_by_user(&self, user_id: &str)
        -> Result<Vec<Prediction>, PredictionError>;
}

/// In-memory implementation of PredictionRepository for development and testing
#[derive(Default)]
pub struct InMemoryPredictionRepository {
    predictions: Mutex<HashMap<Uuid, Prediction>>,
}

impl InMemoryPredictionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prediction_count(&self) -> usize {
        self.predictions.lock().unwrap().len()
    }
}

#[async_trait]
impl PredictionRepository for InMemoryPredictionRepository {
    async fn get(
        &self,
        user_id: &str,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Option<Prediction>, PredictionError> {
        let predictions = self.predictions.lock().unwrap();
        Ok(predictions
            .values()
            .find(|p| {
                p.user_id == user_id && p.race_id == race_id && p.session_type == session_type
            })
            .cloned())
    }

    #[instrument(skip(self, draft, lock))]
    async fn upsert(
        &self,
        draft: PredictionDraft,
        lock: &LockDecision,
    ) -> Result<Prediction, PredictionError> {
        let mut predictions = self.predictions.lock().unwrap();

        if lock.is_locked {
            warn!(
                race_id = %draft.race_id,
                user_id = %draft.user_id,
                "Rejected prediction write after lock boundary"
            );
            return Err(PredictionError::Locked {
                race_id: draft.race_id,
                lock_boundary: lock.lock_boundary,
            });
        }

        let now = Utc::now();
        let existing = predictions.values_mut().find(|p| {
            p.user_id == draft.user_id
                && p.race_id == draft.race_id
                && p.session_type == draft.session_type
        });

        let prediction = match existing {
            Some(prediction) => {
                prediction.top_ten = draft.top_ten;
                prediction.pole_pick = draft.pole_pick;
                prediction.fastest_lap_pick = draft.fastest_lap_pick;
                prediction.updated_at = now;
                prediction.clone()
            }
            None => {
                let prediction = Prediction {
                    id: Uuid::new_v4(),
                    user_id: draft.user_id,
                    race_id: draft.race_id,
                    session_type: draft.session_type,
                    top_ten: draft.top_ten,
                    pole_pick: draft.pole_pick,
                    fastest_lap_pick: draft.fastest_lap_pick,
                    points: None,
                    breakdown: None,
                    created_at: now,
                    updated_at: now,
                };
                predictions.insert(prediction.id, prediction.clone());
                prediction
            }
        };

        debug!(prediction_id = %prediction.id, "Prediction upserted in memory");
        Ok(prediction)
    }

    #[instrument(skip(self, lock))]
    async fn delete(
        &self,
        prediction_id: Uuid,
        user_id: &str,
        lock: &LockDecision,
    ) -> Result<(), PredictionError> {
        let mut predictions = self.predictions.lock().unwrap();

        let owned = predictions
            .get(&prediction_id)
            .filter(|p| p.user_id == user_id)
            .is_some();
        if !owned {
            return Err(PredictionError::NotFound);
        }

        if lock.is_locked {
            let race_id = predictions[&prediction_id].race_id.clone();
            warn!(prediction_id = %prediction_id, "Rejected prediction delete after lock boundary");
            return Err(PredictionError::Locked {
                race_id,
                lock_boundary: lock.lock_boundary,
            });
        }

        predictions.remove(&prediction_id);
        Ok(())
    }

    async fn find_unscored(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Vec<Prediction>, PredictionError> {
        let predictions = self.predictions.lock().unwrap();
        let mut unscored: Vec<Prediction> = predictions
            .values()
            .filter(|p| {
                p.race_id == race_id && p.session_type == session_type && p.points.is_none()
            })
            .cloned()
            .collect();
        unscored.sort_by_key(|p| (p.created_at, p.id));
        Ok(unscored)
    }

    #[instrument(skip(self, breakdown))]
    async fn set_score(
        &self,
        prediction_id: Uuid,
        breakdown: &ScoringBreakdown,
    ) -> Result<bool, PredictionError> {
        let mut predictions = self.predictions.lock().unwrap();
        let prediction = predictions
            .get_mut(&prediction_id)
            .ok_or(PredictionError::NotFound)?;

        if prediction.points.is_some() {
            debug!(prediction_id = %prediction_id, "Prediction already scored, skipping");
            return Ok(false);
        }

        prediction.points = Some(breakdown.total_points);
        prediction.breakdown = Some(breakdown.clone());
        prediction.updated_at = Utc::now();
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn reset_scores(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<u64, PredictionError> {
        let mut predictions = self.predictions.lock().unwrap();
        let mut reset = 0;
        for prediction in predictions.values_mut() {
            if prediction.race_id == race_id
                && prediction.session_type == session_type
                && prediction.points.is_some()
            {
                prediction.points = None;
                prediction.breakdown = None;
                prediction.updated_at = Utc::now();
                reset += 1;
            }
        }
        debug!(race_id = %race_id, reset = reset, "Scores reset for re-scoring");
        Ok(reset)
    }

    async fn find_scored_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Prediction>, PredictionError> {
        let predictions = self.predictions.lock().unwrap();
        let mut scored: Vec<Prediction> = predictions
            .values()
            .filter(|p| p.user_id == user_id && p.points.is_some())
            .cloned()
            .collect();
        scored.sort_by_key(|p| (p.created_at, p.id));
        Ok(scored)
    }
}

/// PostgreSQL implementation of the prediction repository
pub struct PostgresPredictionRepository {
    pool: PgPool,
}

impl PostgresPredictionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_prediction(row: &sqlx::postgres::PgRow) -> Result<Prediction, PredictionError> {
        let breakdown: Option<String> = row.get("breakdown");
        let breakdown = breakdown
            .map(|raw| serde_json::from_str::<ScoringBreakdown>(&raw))
            .transpose()
            .map_err(|e| PredictionError::Repository(format!("invalid stored breakdown: {e}")))?;
        let session_type: String = row.get("session_type");
        let session_type = session_type
            .parse::<SessionType>()
            .map_err(|e| PredictionError::Repository(format!("invalid session type: {e}")))?;

        Ok(Prediction {
            id: row.get("id"),
            user_id: row.get("user_id"),
            race_id: row.get("race_id"),
            session_type,
            top_ten: row.get("top_ten"),
            pole_pick: row.get("pole_pick"),
            fastest_lap_pick: row.get("fastest_lap_pick"),
            points: row.get("points"),
            breakdown,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl PredictionRepository for PostgresPredictionRepository {
    #[instrument(skip(self))]
    async fn get(
        &self,
        user_id: &str,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Option<Prediction>, PredictionError> {
        let row = sqlx::query(
            "SELECT id, user_id, race_id, session_type, top_ten, pole_pick, fastest_lap_pick, \
             points, breakdown, created_at, updated_at \
             FROM predictions WHERE user_id = $1 AND race_id = $2 AND session_type = $3",
        )
        .bind(user_id)
        .bind(race_id)
        .bind(session_type.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PredictionError::Repository(e.to_string()))?;

        row.as_ref().map(Self::row_to_prediction).transpose()
    }

    #[instrument(skip(self, draft, lock))]
    async fn upsert(
        &self,
        draft: PredictionDraft,
        lock: &LockDecision,
    ) -> Result<Prediction, PredictionError> {
        if lock.is_locked {
            warn!(race_id = %draft.race_id, "Rejected prediction write after lock boundary");
            return Err(PredictionError::Locked {
                race_id: draft.race_id,
                lock_boundary: lock.lock_boundary,
            });
        }

        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO predictions \
             (id, user_id, race_id, session_type, top_ten, pole_pick, fastest_lap_pick, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
             ON CONFLICT (user_id, race_id, session_type) DO UPDATE SET \
             top_ten = EXCLUDED.top_ten, pole_pick = EXCLUDED.pole_pick, \
             fastest_lap_pick = EXCLUDED.fastest_lap_pick, updated_at = EXCLUDED.updated_at \
             RETURNING id, user_id, race_id, session_type, top_ten, pole_pick, fastest_lap_pick, \
             points, breakdown, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&draft.user_id)
        .bind(&draft.race_id)
        .bind(draft.session_type.to_string())
        .bind(&draft.top_ten)
        .bind(&draft.pole_pick)
        .bind(&draft.fastest_lap_pick)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to upsert prediction in database");
            PredictionError::Repository(e.to_string())
        })?;

        Self::row_to_prediction(&row)
    }

    #[instrument(skip(self, lock))]
    async fn delete(
        &self,
        prediction_id: Uuid,
        user_id: &str,
        lock: &LockDecision,
    ) -> Result<(), PredictionError> {
        if lock.is_locked {
            let race_id = sqlx::query("SELECT race_id FROM predictions WHERE id = $1")
                .bind(prediction_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PredictionError::Repository(e.to_string()))?
                .map(|row| row.get::<String, _>("race_id"))
                .ok_or(PredictionError::NotFound)?;
            return Err(PredictionError::Locked {
                race_id,
                lock_boundary: lock.lock_boundary,
            });
        }

        let result = sqlx::query("DELETE FROM predictions WHERE id = $1 AND user_id = $2")
            .bind(prediction_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PredictionError::Repository(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PredictionError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_unscored(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Vec<Prediction>, PredictionError> {
        let rows = sqlx::query(
            "SELECT id, user_id, race_id, session_type, top_ten, pole_pick, fastest_lap_pick, \
             points, breakdown, created_at, updated_at \
             FROM predictions WHERE race_id = $1 AND session_type = $2 AND points IS NULL \
             ORDER BY created_at, id",
        )
        .bind(race_id)
        .bind(session_type.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PredictionError::Repository(e.to_string()))?;

        rows.iter().map(Self::row_to_prediction).collect()
    }

    #[instrument(skip(self, breakdown))]
    async fn set_score(
        &self,
        prediction_id: Uuid,
        breakdown: &ScoringBreakdown,
    ) -> Result<bool, PredictionError> {
        let serialized = serde_json::to_string(breakdown)
            .map_err(|e| PredictionError::Repository(e.to_string()))?;

        // The points IS NULL scope makes the unscored→scored transition
        // at-most-once even under concurrent runners.
        let result = sqlx::query(
            "UPDATE predictions SET points = $2, breakdown = $3, updated_at = $4 \
             WHERE id = $1 AND points IS NULL",
        )
        .bind(prediction_id)
        .bind(breakdown.total_points)
        .bind(serialized)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| PredictionError::Repository(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn reset_scores(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<u64, PredictionError> {
        let result = sqlx::query(
            "UPDATE predictions SET points = NULL, breakdown = NULL, updated_at = $3 \
             WHERE race_id = $1 AND session_type = $2 AND points IS NOT NULL",
        )
        .bind(race_id)
        .bind(session_type.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| PredictionError::Repository(e.to_string()))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn find_scored_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Prediction>, PredictionError> {
        let rows = sqlx::query(
            "SELECT id, user_id, race_id, session_type, top_ten, pole_pick, fastest_lap_pick, \
             points, breakdown, created_at, updated_at \
             FROM predictions WHERE user_id = $1 AND points IS NOT NULL \
             ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PredictionError::Repository(e.to_string()))?;

        rows.iter().map(Self::row_to_prediction).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::SessionKind;
    use crate::scoring::{score_prediction, PointTable, RaceResults};
    use chrono::TimeZone;

    fn open_lock() -> LockDecision {
        LockDecision {
            is_locked: false,
            lock_boundary: Some(Utc.with_ymd_and_hms(2025, 5, 4, 13, 45, 0).unwrap()),
            governing_session: Some(SessionKind::Qualifying),
        }
    }

    fn closed_lock() -> LockDecision {
        LockDecision {
            is_locked: true,
            ..open_lock()
        }
    }

    fn draft(user_id: &str) -> PredictionDraft {
        PredictionDraft {
            user_id: user_id.to_string(),
            race_id: "monaco-2025".to_string(),
            session_type: SessionType::Race,
            top_ten: ["VER", "NOR", "LEC", "PIA", "SAI", "HAM", "RUS", "ALO", "GAS", "STR"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            pole_pick: Some("VER".to_string()),
            fastest_lap_pick: Some("NOR".to_string()),
        }
    }

    fn breakdown_for(prediction: &Prediction) -> ScoringBreakdown {
        let results = RaceResults {
            positions: prediction.top_ten.clone(),
            pole: None,
            fastest_lap: None,
        };
        score_prediction(&prediction.picks(), &results, &PointTable::default())
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_in_place() {
        let repo = InMemoryPredictionRepository::new();

        let created = repo.upsert(draft("alice"), &open_lock()).await.unwrap();
        assert!(!created.is_scored());

        let mut changed = draft("alice");
        changed.pole_pick = Some("NOR".to_string());
        let updated = repo.upsert(changed, &open_lock()).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.pole_pick.as_deref(), Some("NOR"));
        assert_eq!(repo.prediction_count(), 1);
    }

    #[tokio::test]
    async fn locked_upsert_is_rejected_with_the_lock_condition() {
        let repo = InMemoryPredictionRepository::new();

        let result = repo.upsert(draft("alice"), &closed_lock()).await;

        assert!(matches!(result, Err(PredictionError::Locked { .. })));
        assert_eq!(repo.prediction_count(), 0);
    }

    #[tokio::test]
    async fn locked_delete_is_rejected_but_missing_prediction_is_not_found() {
        let repo = InMemoryPredictionRepository::new();
        let prediction = repo.upsert(draft("alice"), &open_lock()).await.unwrap();

        let locked = repo.delete(prediction.id, "alice", &closed_lock()).await;
        assert!(matches!(locked, Err(PredictionError::Locked { .. })));

        let missing = repo.delete(Uuid::new_v4(), "alice", &open_lock()).await;
        assert!(matches!(missing, Err(PredictionError::NotFound)));

        repo.delete(prediction.id, "alice", &open_lock())
            .await
            .unwrap();
        assert_eq!(repo.prediction_count(), 0);
    }

    #[tokio::test]
    async fn delete_requires_ownership() {
        let repo = InMemoryPredictionRepository::new();
        let prediction = repo.upsert(draft("alice"), &open_lock()).await.unwrap();

        let result = repo.delete(prediction.id, "bob", &open_lock()).await;

        assert!(matches!(result, Err(PredictionError::NotFound)));
    }

    #[tokio::test]
    async fn set_score_applies_exactly_once() {
        let repo = InMemoryPredictionRepository::new();
        let prediction = repo.upsert(draft("alice"), &open_lock()).await.unwrap();
        let breakdown = breakdown_for(&prediction);

        assert!(repo.set_score(prediction.id, &breakdown).await.unwrap());
        assert!(!repo.set_score(prediction.id, &breakdown).await.unwrap());

        let stored = repo
            .get("alice", "monaco-2025", SessionType::Race)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.points, Some(breakdown.total_points));
        assert_eq!(stored.breakdown, Some(breakdown));
    }

    #[tokio::test]
    async fn find_unscored_excludes_scored_predictions() {
        let repo = InMemoryPredictionRepository::new();
        let first = repo.upsert(draft("alice"), &open_lock()).await.unwrap();
        repo.upsert(draft("bob"), &open_lock()).await.unwrap();

        repo.set_score(first.id, &breakdown_for(&first))
            .await
            .unwrap();

        let unscored = repo
            .find_unscored("monaco-2025", SessionType::Race)
            .await
            .unwrap();
        assert_eq!(unscored.len(), 1);
        assert_eq!(unscored[0].user_id, "bob");
    }

    #[tokio::test]
    async fn reset_scores_reopens_predictions_for_scoring() {
        let repo = InMemoryPredictionRepository::new();
        let prediction = repo.upsert(draft("alice"), &open_lock()).await.unwrap();
        repo.set_score(prediction.id, &breakdown_for(&prediction))
            .await
            .unwrap();

        let reset = repo
            .reset_scores("monaco-2025", SessionType::Race)
            .await
            .unwrap();

        assert_eq!(reset, 1);
        let unscored = repo
            .find_unscored("monaco-2025", SessionType::Race)
            .await
            .unwrap();
        assert_eq!(unscored.len(), 1);
    }

    #[tokio::test]
    async fn scored_history_is_per_user_and_ordered() {
        let repo = InMemoryPredictionRepository::new();
        let alice = repo.upsert(draft("alice"), &open_lock()).await.unwrap();
        repo.upsert(draft("bob"), &open_lock()).await.unwrap();
        repo.set_score(alice.id, &breakdown_for(&alice))
            .await
            .unwrap();

        let history = repo.find_scored_by_user("alice").await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, alice.id);
        assert!(repo.find_scored_by_user("bob").await.unwrap().is_empty());
    }
}
