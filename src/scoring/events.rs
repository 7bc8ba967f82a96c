use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::schedule::SessionType;

/// Lifecycle transitions the job runner emits for external monitoring
/// (cron-status endpoints, dashboards). Facts about what already happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobEvent {
    /// A job row was created for a newly discovered session
    Created {
        race_id: String,
        session_type: SessionType,
    },

    /// The job started processing its outstanding predictions
    Running {
        race_id: String,
        session_type: SessionType,
    },

    /// One more prediction was scored
    Progress {
        race_id: String,
        session_type: SessionType,
        scored: u32,
        total: u32,
    },

    /// The job finished its pass, possibly with per-prediction errors
    Completed {
        race_id: String,
        session_type: SessionType,
        scored: u32,
        errors: u32,
    },

    /// A fatal condition stopped the job before any prediction was scored
    Failed {
        race_id: String,
        session_type: SessionType,
        reason: String,
    },
}

/// Broadcast bus distributing job lifecycle events to any subscriber.
#[derive(Debug, Clone)]
pub struct JobEventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl Default for JobEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl JobEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn emit(&self, event: JobEvent) {
        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(receivers = receiver_count, "Job event emitted");
            }
            Err(_) => {
                debug!("Job event emitted with no receivers");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_events() {
        let bus = JobEventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(JobEvent::Completed {
            race_id: "monaco-2025".to_string(),
            session_type: SessionType::Race,
            scored: 3,
            errors: 0,
        });

        match rx.recv().await.unwrap() {
            JobEvent::Completed { race_id, scored, .. } => {
                assert_eq!(race_id, "monaco-2025");
                assert_eq!(scored, 3);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn emitting_without_subscribers_does_not_panic() {
        let bus = JobEventBus::new();

        bus.emit(JobEvent::Running {
            race_id: "spa-2025".to_string(),
            session_type: SessionType::Sprint,
        });
    }
}
