use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Badge codes awarded by the built-in evaluator.
pub mod badge_codes {
    /// First prediction ever scored.
    pub const FIRST_SCORE: &str = "FIRST_SCORE";
    /// All three podium slots predicted exactly.
    pub const PERFECT_PODIUM: &str = "PERFECT_PODIUM";
    /// Career total of 100 points or more.
    pub const CENTURY: &str = "CENTURY";
}

/// An achievement unlock. Append-only; a given (user, badge) pair unlocks
/// at most once, enforced by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeUnlock {
    pub user_id: String,
    pub badge_code: String,
    pub race_id: Option<String>,
    pub unlocked_at: DateTime<Utc>,
}
