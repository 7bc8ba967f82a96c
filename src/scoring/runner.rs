use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::algorithm::score_prediction;
use super::errors::ScoringError;
use super::events::{JobEvent, JobEventBus};
use super::job::{JobStatus, ScoringJobStore};
use super::points::PointTable;
use super::results::{CompletedSession, RaceResults, ResultsSource};
use crate::badge::BadgeEvaluator;
use crate::notify::NotificationDispatcher;
use crate::prediction::{Prediction, PredictionRepository};
use crate::schedule::SessionType;

/// Outcome of one whole runner invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Sessions for which a job actually ran (completed or failed).
    pub processed: usize,
    pub sessions: Vec<SessionReport>,
}

impl BatchReport {
    fn empty() -> Self {
        Self {
            processed: 0,
            sessions: Vec::new(),
        }
    }
}

/// Outcome of one session's job, distinguishing scored from errored
/// predictions so partial success is explicit.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub race_id: String,
    pub session_type: SessionType,
    pub status: JobStatus,
    pub scored: u32,
    pub errors: u32,
}

/// Orchestrates one scoring pass: discover completed sessions with
/// outstanding predictions, score each prediction exactly once, fan out to
/// badge evaluation and notification, and track job state throughout.
///
/// Safe to invoke repeatedly (periodic polling): a pass that finds nothing
/// outstanding does no work and creates no job rows.
pub struct ScoringJobRunner {
    results: Arc<dyn ResultsSource>,
    predictions: Arc<dyn PredictionRepository>,
    jobs: Arc<dyn ScoringJobStore>,
    badges: Arc<dyn BadgeEvaluator>,
    notifier: Arc<dyn NotificationDispatcher>,
    events: JobEventBus,
    table: PointTable,
}

impl ScoringJobRunner {
    pub fn builder(
        results: Arc<dyn ResultsSource>,
        predictions: Arc<dyn PredictionRepository>,
        jobs: Arc<dyn ScoringJobStore>,
        badges: Arc<dyn BadgeEvaluator>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> ScoringJobRunnerBuilder {
        ScoringJobRunnerBuilder {
            results,
            predictions,
            jobs,
            badges,
            notifier,
            events: None,
            table: None,
        }
    }

    pub fn events(&self) -> &JobEventBus {
        &self.events
    }

    /// One full scoring pass over every discovered session. Sessions are
    /// independent: a fatal error in one never affects the others.
    #[instrument(skip(self))]
    pub async fn run_batch(&self) -> Result<BatchReport, ScoringError> {
        let completed = self.results.get_completed_sessions().await?;
        if completed.is_empty() {
            debug!("No completed sessions to score");
            return Ok(BatchReport::empty());
        }

        let mut reports = Vec::new();
        for session in completed {
            let outstanding = match self
                .predictions
                .find_unscored(&session.race_id, session.session_type)
                .await
            {
                Ok(outstanding) => outstanding,
                Err(e) => {
                    error!(
                        race_id = %session.race_id,
                        session_type = %session.session_type,
                        error = %e,
                        "Failed to load outstanding predictions, skipping session"
                    );
                    continue;
                }
            };
            if outstanding.is_empty() {
                debug!(
                    race_id = %session.race_id,
                    session_type = %session.session_type,
                    "No outstanding predictions, skipping session"
                );
                continue;
            }

            match self.process_session(&session).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    // Infrastructure failure for this session only; the
                    // remaining sessions still get their pass.
                    error!(
                        race_id = %session.race_id,
                        session_type = %session.session_type,
                        error = %e,
                        "Scoring job aborted for session"
                    );
                }
            }
        }

        Ok(BatchReport {
            processed: reports.len(),
            sessions: reports,
        })
    }

    /// Operator-triggered re-score: clears existing scores for the session
    /// and runs its job again. The only sanctioned way to score twice.
    #[instrument(skip(self))]
    pub async fn rescore(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<SessionReport, ScoringError> {
        let session = self
            .results
            .get_completed_sessions()
            .await?
            .into_iter()
            .find(|s| s.race_id == race_id && s.session_type == session_type)
            .ok_or_else(|| ScoringError::ResultsUnavailable {
                race_id: race_id.to_string(),
                session_type,
            })?;

        let reset = self.predictions.reset_scores(race_id, session_type).await?;
        info!(race_id = %race_id, session_type = %session_type, reset = reset, "Scores reset for re-scoring");

        self.process_session(&session).await
    }

    async fn process_session(
        &self,
        session: &CompletedSession,
    ) -> Result<SessionReport, ScoringError> {
        let race_id = &session.race_id;
        let session_type = session.session_type;

        let known = self.jobs.get(race_id, session_type).await?;
        let job = self.jobs.begin(race_id, session_type).await?;
        if known.is_none() {
            self.events.emit(JobEvent::Created {
                race_id: race_id.clone(),
                session_type,
            });
        }
        self.events.emit(JobEvent::Running {
            race_id: race_id.clone(),
            session_type,
        });

        // Parsed once per session, never once per prediction. Parse
        // failure is fatal for this job and leaves no partial state.
        let results = match RaceResults::from_payload(&session.payload) {
            Ok(results) => results,
            Err(e) => {
                let reason = e.to_string();
                warn!(race_id = %race_id, error = %reason, "Results payload unparseable, failing job");
                self.jobs.fail(job.id, &reason).await?;
                self.events.emit(JobEvent::Failed {
                    race_id: race_id.clone(),
                    session_type,
                    reason,
                });
                return Ok(SessionReport {
                    race_id: race_id.clone(),
                    session_type,
                    status: JobStatus::Failed,
                    scored: 0,
                    errors: 0,
                });
            }
        };

        let outstanding = self.predictions.find_unscored(race_id, session_type).await?;
        let total = outstanding.len() as u32;

        if outstanding.is_empty() {
            // Another invocation got here first; nothing left is not an error.
            self.jobs.complete(job.id, 0, 0, 0).await?;
            self.events.emit(JobEvent::Completed {
                race_id: race_id.clone(),
                session_type,
                scored: 0,
                errors: 0,
            });
            return Ok(SessionReport {
                race_id: race_id.clone(),
                session_type,
                status: JobStatus::Completed,
                scored: 0,
                errors: 0,
            });
        }

        info!(
            race_id = %race_id,
            session_type = %session_type,
            outstanding = total,
            "Scoring outstanding predictions"
        );

        let mut scored = 0u32;
        let mut errors = 0u32;
        for prediction in &outstanding {
            match self.score_one(prediction, &results, session_type).await {
                Ok(true) => {
                    scored += 1;
                    self.events.emit(JobEvent::Progress {
                        race_id: race_id.clone(),
                        session_type,
                        scored,
                        total,
                    });
                }
                Ok(false) => {
                    debug!(prediction_id = %prediction.id, "Prediction already scored elsewhere, skipping");
                }
                Err(e) => {
                    // One prediction failing never aborts the batch.
                    errors += 1;
                    warn!(
                        prediction_id = %prediction.id,
                        user_id = %prediction.user_id,
                        error = %e,
                        "Failed to score prediction, continuing"
                    );
                }
            }
        }

        self.jobs.complete(job.id, scored, errors, total).await?;
        self.events.emit(JobEvent::Completed {
            race_id: race_id.clone(),
            session_type,
            scored,
            errors,
        });
        info!(
            race_id = %race_id,
            session_type = %session_type,
            scored = scored,
            errors = errors,
            "Scoring job completed"
        );

        Ok(SessionReport {
            race_id: race_id.clone(),
            session_type,
            status: JobStatus::Completed,
            scored,
            errors,
        })
    }

    /// Scores one prediction and, only after the score is durably
    /// persisted, runs badge evaluation then notification. Fan-out
    /// failures are logged but never undo the score and never count
    /// against the job.
    async fn score_one(
        &self,
        prediction: &Prediction,
        results: &RaceResults,
        session_type: SessionType,
    ) -> Result<bool, ScoringError> {
        let breakdown = score_prediction(&prediction.picks(), results, &self.table);

        let applied = self
            .predictions
            .set_score(prediction.id, &breakdown)
            .await?;
        if !applied {
            return Ok(false);
        }

        if let Err(e) = self
            .badges
            .evaluate(&prediction.user_id, &prediction.race_id, prediction.id)
            .await
        {
            warn!(
                prediction_id = %prediction.id,
                error = %e,
                "Badge evaluation failed after score persisted"
            );
        }

        if let Err(e) = self
            .notifier
            .notify_scored(
                &prediction.user_id,
                &prediction.race_id,
                session_type,
                breakdown.total_points,
            )
            .await
        {
            warn!(
                prediction_id = %prediction.id,
                error = %e,
                "Notification dispatch failed after score persisted"
            );
        }

        Ok(true)
    }
}

pub struct ScoringJobRunnerBuilder {
    results: Arc<dyn ResultsSource>,
    predictions: Arc<dyn PredictionRepository>,
    jobs: Arc<dyn ScoringJobStore>,
    badges: Arc<dyn BadgeEvaluator>,
    notifier: Arc<dyn NotificationDispatcher>,
    events: Option<JobEventBus>,
    table: Option<PointTable>,
}

impl ScoringJobRunnerBuilder {
    pub fn with_events(mut self, events: JobEventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_point_table(mut self, table: PointTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn build(self) -> ScoringJobRunner {
        ScoringJobRunner {
            results: self.results,
            predictions: self.predictions,
            jobs: self.jobs,
            badges: self.badges,
            notifier: self.notifier,
            events: self.events.unwrap_or_default(),
            table: self.table.unwrap_or_default(),
        }
    }
}
