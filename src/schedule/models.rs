use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// The on-track sessions that make up a race weekend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    Fp1,
    Fp2,
    Fp3,
    SprintQualifying,
    Sprint,
    Qualifying,
    Race,
}

/// The subset of sessions that carry their own scored prediction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    Race,
    Sprint,
}

impl SessionType {
    pub fn session_kind(&self) -> SessionKind {
        match self {
            SessionType::Race => SessionKind::Race,
            SessionType::Sprint => SessionKind::Sprint,
        }
    }
}

/// A single scheduled session within a race weekend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledSession {
    pub kind: SessionKind,
    pub starts_at: DateTime<Utc>,
}

/// The session schedule for one race weekend.
///
/// At most one entry per kind; a fully loaded weekend always has a RACE
/// entry, but the schedule tolerates partial data (e.g. qualifying not
/// yet published by the upstream calendar).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSchedule {
    sessions: Vec<ScheduledSession>,
}

impl SessionSchedule {
    pub fn new(sessions: Vec<ScheduledSession>) -> Self {
        let mut deduped: Vec<ScheduledSession> = Vec::with_capacity(sessions.len());
        for session in sessions {
            if !deduped.iter().any(|s| s.kind == session.kind) {
                deduped.push(session);
            }
        }
        Self { sessions: deduped }
    }

    pub fn session(&self, kind: SessionKind) -> Option<&ScheduledSession> {
        self.sessions.iter().find(|s| s.kind == kind)
    }

    pub fn sessions(&self) -> &[ScheduledSession] {
        &self.sessions
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn keeps_first_entry_per_kind() {
        let first = Utc.with_ymd_and_hms(2025, 5, 4, 14, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 5, 4, 16, 0, 0).unwrap();
        let schedule = SessionSchedule::new(vec![
            ScheduledSession {
                kind: SessionKind::Race,
                starts_at: first,
            },
            ScheduledSession {
                kind: SessionKind::Race,
                starts_at: second,
            },
        ]);

        assert_eq!(schedule.sessions().len(), 1);
        assert_eq!(schedule.session(SessionKind::Race).unwrap().starts_at, first);
    }

    #[test]
    fn lookup_by_kind() {
        let quali_start = Utc.with_ymd_and_hms(2025, 5, 3, 15, 0, 0).unwrap();
        let schedule = SessionSchedule::new(vec![ScheduledSession {
            kind: SessionKind::Qualifying,
            starts_at: quali_start,
        }]);

        assert!(schedule.session(SessionKind::Race).is_none());
        assert_eq!(
            schedule.session(SessionKind::Qualifying).unwrap().starts_at,
            quali_start
        );
    }
}
