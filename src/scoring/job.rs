use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use strum_macros::{Display, EnumString};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::errors::ScoringError;
use crate::schedule::SessionType;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One batch-scoring run for one (race, session type). A job row is
/// created at most once per pair and reused across re-runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringJob {
    pub id: Uuid,
    pub race_id: String,
    pub session_type: SessionType,
    pub status: JobStatus,
    pub scored_count: u32,
    pub error_count: u32,
    pub total_count: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl ScoringJob {
    fn new(race_id: &str, session_type: SessionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            race_id: race_id.to_string(),
            session_type,
            status: JobStatus::Pending,
            scored_count: 0,
            error_count: 0,
            total_count: 0,
            started_at: None,
            finished_at: None,
            error_message: None,
        }
    }
}

/// Persistence boundary for job lifecycle state.
#[async_trait]
pub trait ScoringJobStore: Send + Sync {
    /// Creates the job row for this (race, session type) if it does not
    /// exist, then transitions it to RUNNING and stamps started_at.
    /// Idempotent: a re-run reuses the existing row.
    async fn begin(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<ScoringJob, ScoringError>;

    async fn complete(
        &self,
        job_id: Uuid,
        scored_count: u32,
        error_count: u32,
        total_count: u32,
    ) -> Result<ScoringJob, ScoringError>;

    async fn fail(&self, job_id: Uuid, message: &str) -> Result<ScoringJob, ScoringError>;

    async fn get(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Option<ScoringJob>, ScoringError>;

    async fn list(&self) -> Result<Vec<ScoringJob>, ScoringError>;
}

/// In-memory implementation of ScoringJobStore for development and testing
#[derive(Default)]
pub struct InMemoryScoringJobStore {
    jobs: Mutex<HashMap<(String, SessionType), ScoringJob>>,
}

impl InMemoryScoringJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_by_id<F>(&self, job_id: Uuid, apply: F) -> Result<ScoringJob, ScoringError>
    where
        F: FnOnce(&mut ScoringJob),
    {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .values_mut()
            .find(|job| job.id == job_id)
            .ok_or_else(|| ScoringError::JobStore(format!("job {job_id} not found")))?;
        apply(job);
        Ok(job.clone())
    }
}

#[async_trait]
impl ScoringJobStore for InMemoryScoringJobStore {
    #[instrument(skip(self))]
    async fn begin(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<ScoringJob, ScoringError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .entry((race_id.to_string(), session_type))
            .or_insert_with(|| {
                debug!(race_id = %race_id, session_type = %session_type, "Creating scoring job");
                ScoringJob::new(race_id, session_type)
            });

        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        job.finished_at = None;
        job.error_message = None;

        Ok(job.clone())
    }

    async fn complete(
        &self,
        job_id: Uuid,
        scored_count: u32,
        error_count: u32,
        total_count: u32,
    ) -> Result<ScoringJob, ScoringError> {
        self.update_by_id(job_id, |job| {
            job.status = JobStatus::Completed;
            job.scored_count = scored_count;
            job.error_count = error_count;
            job.total_count = total_count;
            job.finished_at = Some(Utc::now());
        })
    }

    async fn fail(&self, job_id: Uuid, message: &str) -> Result<ScoringJob, ScoringError> {
        self.update_by_id(job_id, |job| {
            job.status = JobStatus::Failed;
            job.error_message = Some(message.to_string());
            job.finished_at = Some(Utc::now());
        })
    }

    async fn get(
        &self,
        race_id: &str,
        session_type: SessionType,
    ) -> Result<Option<ScoringJob>, ScoringError> {
        let jobs = self.jobs.lock().unwrap();
        Ok(jobs.get(&(race_id.to_string(), session_type)).cloned())
    }

    async fn list(&self) -> Result<Vec<ScoringJob>, ScoringError> {
        let jobs = self.jobs.lock().unwrap();
        let mut all: Vec<ScoringJob> = jobs.values().cloned().collect();
        all.sort_by_key(|job| (job.race_id.clone(), job.session_type.to_string()));
        Ok(all)
    }
}
