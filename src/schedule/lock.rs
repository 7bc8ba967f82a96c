use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::models::{SessionKind, SessionSchedule};

/// Minutes before the governing session start at which predictions lock.
pub const DEFAULT_LOCK_BUFFER_MINUTES: i64 = 15;

/// Sessions that can gate prediction mutability, in priority order.
const GOVERNING_PRIORITY: [SessionKind; 3] = [
    SessionKind::SprintQualifying,
    SessionKind::Qualifying,
    SessionKind::Race,
];

/// Configuration for the lock clock
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// How long before the governing session start predictions become immutable
    pub buffer: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            buffer: Duration::minutes(DEFAULT_LOCK_BUFFER_MINUTES),
        }
    }
}

/// Derived lock state for one race weekend. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDecision {
    pub is_locked: bool,
    pub lock_boundary: Option<DateTime<Utc>>,
    pub governing_session: Option<SessionKind>,
}

impl LockDecision {
    /// A schedule with no governing session stays open indefinitely.
    /// Callers treat this as a data-completeness problem, not a crash.
    pub fn open_indefinitely() -> Self {
        Self {
            is_locked: false,
            lock_boundary: None,
            governing_session: None,
        }
    }
}

/// Computes whether predictions for this weekend are still mutable at `now`.
///
/// The governing session is picked by priority SPRINT_QUALIFYING >
/// QUALIFYING > RACE. A weekend with only a RACE entry (qualifying data not
/// yet loaded) still locks relative to the race start; that fallback is
/// deliberate. The boundary itself is inclusive: at the exact boundary
/// instant the prediction is already locked.
///
/// Pure function: the caller supplies `now`, the clock is never read here.
pub fn lock_decision(
    schedule: &SessionSchedule,
    now: DateTime<Utc>,
    config: &LockConfig,
) -> LockDecision {
    let governing = GOVERNING_PRIORITY
        .iter()
        .find_map(|kind| schedule.session(*kind));

    let Some(governing) = governing else {
        return LockDecision::open_indefinitely();
    };

    let boundary = governing.starts_at - config.buffer;

    LockDecision {
        is_locked: now >= boundary,
        lock_boundary: Some(boundary),
        governing_session: Some(governing.kind),
    }
}
