// Library crate for the Gridcast prediction scoring engine
// This file exposes the public API for integration tests

pub mod badge;
pub mod notify;
pub mod prediction;
pub mod schedule;
pub mod scoring;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use badge::{BadgeEvaluator, BadgeLedger, BadgeUnlock, HistoryBadgeEvaluator, InMemoryBadgeLedger};
pub use notify::{NotificationDispatcher, TracingNotificationDispatcher};
pub use prediction::{
    InMemoryPredictionRepository, Prediction, PredictionDraft, PredictionError,
    PredictionRepository, PredictionService,
};
pub use schedule::{
    lock_decision, LockConfig, LockDecision, SessionKind, SessionSchedule, SessionType,
};
pub use scoring::{
    score_prediction, JobEvent, JobEventBus, JobStatus, PointTable, RaceResults, ScoringBreakdown,
    ScoringJobRunner,
};
pub use shared::AppError;
