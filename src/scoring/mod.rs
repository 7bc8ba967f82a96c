pub mod algorithm;
pub mod events;
pub mod handlers;
pub mod job;
pub mod poll_task;
pub mod points;
pub mod results;
pub mod runner;

mod errors;
mod models;

pub use algorithm::score_prediction;
pub use errors::ScoringError;
pub use events::{JobEvent, JobEventBus};
pub use job::{InMemoryScoringJobStore, JobStatus, ScoringJob, ScoringJobStore};
pub use models::{PositionDetail, PositionOutcome, RankedPicks, ScoringBreakdown};
pub use points::{PointTable, TOP_TEN_SLOTS};
pub use poll_task::{start_scoring_poll_task, PollConfig};
pub use results::{CompletedSession, InMemoryResultsSource, RaceResults, ResultsSource};
pub use runner::{BatchReport, ScoringJobRunner, SessionReport};
