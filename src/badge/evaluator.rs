use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::errors::BadgeError;
use super::ledger::BadgeLedger;
use super::models::{badge_codes, BadgeUnlock};
use crate::prediction::PredictionRepository;
use crate::scoring::PositionOutcome;

/// Collaborator invoked exactly once per successfully persisted score.
///
/// Must be idempotent: re-evaluating a user whose badges already unlocked
/// is a no-op. The scoring runner guarantees the call happens after the
/// score is durable, so a crash here never loses a score.
#[async_trait]
pub trait BadgeEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        user_id: &str,
        race_id: &str,
        prediction_id: Uuid,
    ) -> Result<Vec<BadgeUnlock>, BadgeError>;
}

/// Evaluator that derives unlocks from the user's full scored history.
pub struct HistoryBadgeEvaluator {
    predictions: Arc<dyn PredictionRepository>,
    ledger: Arc<dyn BadgeLedger>,
}

impl HistoryBadgeEvaluator {
    pub fn new(predictions: Arc<dyn PredictionRepository>, ledger: Arc<dyn BadgeLedger>) -> Self {
        Self {
            predictions,
            ledger,
        }
    }
}

#[async_trait]
impl BadgeEvaluator for HistoryBadgeEvaluator {
    #[instrument(skip(self))]
    async fn evaluate(
        &self,
        user_id: &str,
        race_id: &str,
        prediction_id: Uuid,
    ) -> Result<Vec<BadgeUnlock>, BadgeError> {
        let history = self
            .predictions
            .find_scored_by_user(user_id)
            .await
            .map_err(|e| BadgeError::History(e.to_string()))?;

        let mut earned: Vec<(&str, Option<&str>)> = Vec::new();

        if !history.is_empty() {
            earned.push((badge_codes::FIRST_SCORE, Some(race_id)));
        }

        let scored_now = history.iter().find(|p| p.id == prediction_id);
        if let Some(prediction) = scored_now {
            let perfect_podium = prediction
                .breakdown
                .as_ref()
                .map(|b| {
                    b.details
                        .iter()
                        .take(3)
                        .all(|d| d.outcome == PositionOutcome::Exact)
                })
                .unwrap_or(false);
            if perfect_podium {
                earned.push((badge_codes::PERFECT_PODIUM, Some(race_id)));
            }
        }

        let career_total: i64 = history.iter().filter_map(|p| p.points).map(i64::from).sum();
        if career_total >= 100 {
            earned.push((badge_codes::CENTURY, None));
        }

        let mut unlocked = Vec::new();
        for (badge_code, badge_race) in earned {
            if self
                .ledger
                .record_unlock(user_id, badge_code, badge_race)
                .await?
            {
                debug!(user_id = %user_id, badge_code = %badge_code, "Badge unlocked");
                let unlocks = self.ledger.unlocks_for(user_id).await?;
                if let Some(unlock) = unlocks.iter().rev().find(|u| u.badge_code == badge_code) {
                    unlocked.push(unlock.clone());
                }
            }
        }

        Ok(unlocked)
    }
}
