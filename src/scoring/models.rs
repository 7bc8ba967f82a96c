use serde::{Deserialize, Serialize};

/// The picks a scoring pass consumes: a predicted finishing order plus the
/// two bonus picks. Empty strings mark unfilled slots and never match.
#[derive(Debug, Clone, Copy)]
pub struct RankedPicks<'a> {
    pub top_ten: &'a [String],
    pub pole_pick: Option<&'a str>,
    pub fastest_lap_pick: Option<&'a str>,
}

/// How one predicted slot fared against the official result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionOutcome {
    /// Predicted driver finished exactly at the predicted position.
    Exact,
    /// Predicted driver finished in the top ten, but elsewhere.
    Misplaced { actual_position: usize },
    /// Predicted driver is not in the official top ten (or the slot was empty).
    Miss,
}

/// Per-slot explanation backing the UI-level review of a scored prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDetail {
    /// 1-based predicted position.
    pub position: usize,
    pub predicted: Option<String>,
    #[serde(flatten)]
    pub outcome: PositionOutcome,
    pub points: i32,
}

/// The structured, recomputable result of scoring one prediction.
///
/// Exact-slot and correct-but-misplaced credit are kept in separate
/// accumulators so the two scoring paths stay auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringBreakdown {
    pub position_points: i32,
    pub partial_points: i32,
    pub pole_points: i32,
    pub fastest_lap_points: i32,
    pub podium_bonus: i32,
    pub total_points: i32,
    pub details: Vec<PositionDetail>,
}
