use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::models::SessionSchedule;
use crate::shared::AppError;

/// External collaborator providing the session calendar per race weekend.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn get_schedule(&self, race_id: &str) -> Result<Option<SessionSchedule>, AppError>;
}

/// In-memory schedule source for development and testing
#[derive(Default)]
pub struct InMemoryScheduleSource {
    schedules: Mutex<HashMap<String, SessionSchedule>>,
}

impl InMemoryScheduleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, race_id: &str, schedule: SessionSchedule) {
        self.schedules
            .lock()
            .unwrap()
            .insert(race_id.to_string(), schedule);
    }
}

#[async_trait]
impl ScheduleSource for InMemoryScheduleSource {
    async fn get_schedule(&self, race_id: &str) -> Result<Option<SessionSchedule>, AppError> {
        let schedules = self.schedules.lock().unwrap();
        let schedule = schedules.get(race_id).cloned();
        if schedule.is_none() {
            debug!(race_id = %race_id, "No schedule loaded for race");
        }
        Ok(schedule)
    }
}
