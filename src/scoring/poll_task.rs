use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument};

use super::runner::ScoringJobRunner;

/// Configuration for the periodic scoring poll
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// How often to look for newly completed sessions
    pub poll_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15 * 60), // 15 minutes
        }
    }
}

/// Starts the background task that periodically runs the scoring batch.
/// Re-entrancy of the runner makes overlapping ticks harmless: a pass
/// that finds nothing outstanding does no work.
#[instrument(skip(runner))]
pub async fn start_scoring_poll_task(runner: Arc<ScoringJobRunner>, config: PollConfig) {
    info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        "Starting scoring poll background task"
    );

    let mut poll_interval = interval(config.poll_interval);

    loop {
        poll_interval.tick().await;

        match runner.run_batch().await {
            Ok(report) => {
                info!(processed = report.processed, "Scoring poll completed");
            }
            Err(e) => {
                error!(error = %e, "Scoring poll failed");
            }
        }
    }
}
