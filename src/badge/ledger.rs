use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::debug;

use super::errors::BadgeError;
use super::models::BadgeUnlock;

/// Append-only store of badge unlocks.
#[async_trait]
pub trait BadgeLedger: Send + Sync {
    /// Records an unlock if this (user, badge) pair has never unlocked
    /// before. Returns whether a new unlock was recorded; re-recording an
    /// existing unlock is a no-op, never a duplicate.
    async fn record_unlock(
        &self,
        user_id: &str,
        badge_code: &str,
        race_id: Option<&str>,
    ) -> Result<bool, BadgeError>;

    async fn unlocks_for(&self, user_id: &str) -> Result<Vec<BadgeUnlock>, BadgeError>;
}

/// In-memory badge ledger for development and testing
#[derive(Default)]
pub struct InMemoryBadgeLedger {
    unlocks: Mutex<Vec<BadgeUnlock>>,
    seen: Mutex<HashSet<(String, String)>>,
}

impl InMemoryBadgeLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BadgeLedger for InMemoryBadgeLedger {
    async fn record_unlock(
        &self,
        user_id: &str,
        badge_code: &str,
        race_id: Option<&str>,
    ) -> Result<bool, BadgeError> {
        let mut seen = self.seen.lock().unwrap();
        if !seen.insert((user_id.to_string(), badge_code.to_string())) {
            debug!(user_id = %user_id, badge_code = %badge_code, "Badge already unlocked, skipping");
            return Ok(false);
        }

        self.unlocks.lock().unwrap().push(BadgeUnlock {
            user_id: user_id.to_string(),
            badge_code: badge_code.to_string(),
            race_id: race_id.map(str::to_string),
            unlocked_at: Utc::now(),
        });
        Ok(true)
    }

    async fn unlocks_for(&self, user_id: &str) -> Result<Vec<BadgeUnlock>, BadgeError> {
        let unlocks = self.unlocks.lock().unwrap();
        Ok(unlocks
            .iter()
            .filter(|u| u.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_badge_unlocks_at_most_once_per_user() {
        let ledger = InMemoryBadgeLedger::new();

        assert!(ledger
            .record_unlock("alice", "FIRST_SCORE", Some("monaco-2025"))
            .await
            .unwrap());
        assert!(!ledger
            .record_unlock("alice", "FIRST_SCORE", Some("spa-2025"))
            .await
            .unwrap());

        let unlocks = ledger.unlocks_for("alice").await.unwrap();
        assert_eq!(unlocks.len(), 1);
        assert_eq!(unlocks[0].race_id.as_deref(), Some("monaco-2025"));
    }

    #[tokio::test]
    async fn different_users_unlock_independently() {
        let ledger = InMemoryBadgeLedger::new();

        ledger
            .record_unlock("alice", "FIRST_SCORE", None)
            .await
            .unwrap();
        assert!(ledger
            .record_unlock("bob", "FIRST_SCORE", None)
            .await
            .unwrap());
    }
}
