use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::schedule::SessionType;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

/// Collaborator invoked after each successful score write. Delivery
/// mechanics (push, email) live outside this core.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify_scored(
        &self,
        user_id: &str,
        race_id: &str,
        session_type: SessionType,
        total_points: i32,
    ) -> Result<(), NotifyError>;
}

/// Dispatcher that only logs. Default wiring for development.
#[derive(Default)]
pub struct TracingNotificationDispatcher;

impl TracingNotificationDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationDispatcher for TracingNotificationDispatcher {
    async fn notify_scored(
        &self,
        user_id: &str,
        race_id: &str,
        session_type: SessionType,
        total_points: i32,
    ) -> Result<(), NotifyError> {
        info!(
            user_id = %user_id,
            race_id = %race_id,
            session_type = %session_type,
            total_points = total_points,
            "Prediction scored"
        );
        Ok(())
    }
}
