/// Number of finishing positions a prediction covers.
pub const TOP_TEN_SLOTS: usize = 10;

/// The product-defined point constants for scoring a prediction.
///
/// Kept as a single overridable table so the exact magnitudes can be tuned
/// (or confirmed against the product rules) without touching the scoring
/// algorithm itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTable {
    /// Points for an exact position match, indexed P1..P10.
    pub position_points: [i32; TOP_TEN_SLOTS],
    /// Flat credit for a driver predicted in the top ten but at the wrong slot.
    pub partial_credit: i32,
    /// Bonus for predicting P1/P2/P3 in exactly the right order.
    pub podium_exact_bonus: i32,
    /// Bonus for predicting the right three podium drivers in any order.
    /// Superseded by the exact-order bonus, never paid alongside it.
    pub podium_any_order_bonus: i32,
    pub pole_bonus: i32,
    pub fastest_lap_bonus: i32,
}

impl Default for PointTable {
    fn default() -> Self {
        Self {
            position_points: [25, 18, 15, 12, 10, 8, 6, 4, 2, 1],
            partial_credit: 2,
            podium_exact_bonus: 10,
            podium_any_order_bonus: 5,
            pole_bonus: 10,
            fastest_lap_bonus: 5,
        }
    }
}

impl PointTable {
    /// Points for an exact hit at the given 1-based position.
    pub fn position_value(&self, position: usize) -> i32 {
        debug_assert!((1..=TOP_TEN_SLOTS).contains(&position));
        self.position_points[position - 1]
    }

    /// The theoretical maximum a single prediction can score. Per slot the
    /// best case is max(exact value, partial credit): a misplaced pick can
    /// outscore an exact P10 when the flat partial credit exceeds it
    /// (e.g. predicting the actual P9 and P10 drivers swapped).
    pub fn max_total(&self) -> i32 {
        self.position_points
            .iter()
            .map(|points| (*points).max(self.partial_credit))
            .sum::<i32>()
            + self.podium_exact_bonus
            + self.pole_bonus
            + self.fastest_lap_bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_product_constants() {
        let table = PointTable::default();
        assert_eq!(table.position_value(1), 25);
        assert_eq!(table.position_value(10), 1);
        // P9 and P10 exact values are capped from below by partial credit.
        assert_eq!(table.max_total(), 102 + 10 + 10 + 5);
    }
}
