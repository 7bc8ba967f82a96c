pub mod lock;
pub mod models;
pub mod source;

pub use lock::{lock_decision, LockConfig, LockDecision, DEFAULT_LOCK_BUFFER_MINUTES};
pub use models::{ScheduledSession, SessionKind, SessionSchedule, SessionType};
pub use source::{InMemoryScheduleSource, ScheduleSource};
