use super::models::{PositionDetail, PositionOutcome, RankedPicks, ScoringBreakdown};
use super::points::{PointTable, TOP_TEN_SLOTS};
use super::results::RaceResults;

/// Scores one prediction against the official results of a session.
///
/// Pure function: no I/O, no clock, no caches. Identical inputs always
/// produce an identical breakdown. Empty or short predictions are scored
/// defensively (empty slots never match, contribute zero) rather than
/// rejected.
pub fn score_prediction(
    picks: &RankedPicks<'_>,
    results: &RaceResults,
    table: &PointTable,
) -> ScoringBreakdown {
    let mut position_points = 0;
    let mut partial_points = 0;
    let mut details = Vec::with_capacity(TOP_TEN_SLOTS);

    for slot in 0..TOP_TEN_SLOTS {
        let predicted = picks
            .top_ten
            .get(slot)
            .map(String::as_str)
            .filter(|driver| !driver.is_empty());

        let Some(driver) = predicted else {
            details.push(PositionDetail {
                position: slot + 1,
                predicted: None,
                outcome: PositionOutcome::Miss,
                points: 0,
            });
            continue;
        };

        let (outcome, points) = match results.finishing_position(driver) {
            Some(actual) if actual == slot + 1 => {
                (PositionOutcome::Exact, table.position_value(slot + 1))
            }
            Some(actual) => (
                PositionOutcome::Misplaced {
                    actual_position: actual,
                },
                table.partial_credit,
            ),
            None => (PositionOutcome::Miss, 0),
        };

        match outcome {
            PositionOutcome::Exact => position_points += points,
            PositionOutcome::Misplaced { .. } => partial_points += points,
            PositionOutcome::Miss => {}
        }

        details.push(PositionDetail {
            position: slot + 1,
            predicted: Some(driver.to_string()),
            outcome,
            points,
        });
    }

    let podium_bonus = podium_bonus(picks.top_ten, &results.positions, table);

    let pole_points = bonus_if_match(picks.pole_pick, results.pole.as_deref(), table.pole_bonus);
    let fastest_lap_points = bonus_if_match(
        picks.fastest_lap_pick,
        results.fastest_lap.as_deref(),
        table.fastest_lap_bonus,
    );

    ScoringBreakdown {
        position_points,
        partial_points,
        pole_points,
        fastest_lap_points,
        podium_bonus,
        total_points: position_points
            + partial_points
            + pole_points
            + fastest_lap_points
            + podium_bonus,
        details,
    }
}

/// Exact-order podium beats any-order podium; the two are never paid together.
fn podium_bonus(predicted: &[String], actual: &[String], table: &PointTable) -> i32 {
    let predicted_podium: Vec<&str> = predicted
        .iter()
        .take(3)
        .map(String::as_str)
        .filter(|driver| !driver.is_empty())
        .collect();

    if predicted_podium.len() < 3 || actual.len() < 3 {
        return 0;
    }

    let actual_podium: Vec<&str> = actual.iter().take(3).map(String::as_str).collect();

    if predicted_podium == actual_podium {
        return table.podium_exact_bonus;
    }

    let mut predicted_sorted = predicted_podium;
    let mut actual_sorted = actual_podium;
    predicted_sorted.sort_unstable();
    actual_sorted.sort_unstable();

    if predicted_sorted == actual_sorted {
        table.podium_any_order_bonus
    } else {
        0
    }
}

fn bonus_if_match(pick: Option<&str>, actual: Option<&str>, bonus: i32) -> i32 {
    match (pick, actual) {
        (Some(pick), Some(actual)) if !pick.is_empty() && pick == actual => bonus,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn drivers(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn full_grid() -> Vec<String> {
        drivers(&[
            "VER", "NOR", "LEC", "PIA", "SAI", "HAM", "RUS", "ALO", "GAS", "STR",
        ])
    }

    fn results_for(positions: Vec<String>) -> RaceResults {
        RaceResults {
            positions,
            pole: Some("VER".to_string()),
            fastest_lap: Some("NOR".to_string()),
        }
    }

    fn picks<'a>(top_ten: &'a [String]) -> RankedPicks<'a> {
        RankedPicks {
            top_ten,
            pole_pick: Some("VER"),
            fastest_lap_pick: Some("NOR"),
        }
    }

    #[test]
    fn perfect_prediction_scores_every_exact_constant_plus_all_bonuses() {
        let grid = full_grid();
        let table = PointTable::default();

        let breakdown = score_prediction(&picks(&grid), &results_for(full_grid()), &table);

        let all_exact: i32 = table.position_points.iter().sum();
        assert_eq!(breakdown.position_points, all_exact);
        assert_eq!(breakdown.partial_points, 0);
        assert_eq!(breakdown.podium_bonus, table.podium_exact_bonus);
        assert_eq!(breakdown.pole_points, table.pole_bonus);
        assert_eq!(breakdown.fastest_lap_points, table.fastest_lap_bonus);
        assert_eq!(
            breakdown.total_points,
            all_exact + table.podium_exact_bonus + table.pole_bonus + table.fastest_lap_bonus
        );
        assert!(breakdown
            .details
            .iter()
            .all(|d| d.outcome == PositionOutcome::Exact));
    }

    #[test]
    fn same_podium_in_wrong_order_pays_any_order_bonus_only() {
        // Predicted A,B,C; actual B,C,A: same three drivers, none on the
        // right slot. Each earns partial credit plus the any-order bonus.
        let predicted = drivers(&[
            "VER", "NOR", "LEC", "PIA", "SAI", "HAM", "RUS", "ALO", "GAS", "STR",
        ]);
        let actual = drivers(&[
            "NOR", "LEC", "VER", "PIA", "SAI", "HAM", "RUS", "ALO", "GAS", "STR",
        ]);
        let table = PointTable::default();

        let breakdown = score_prediction(
            &RankedPicks {
                top_ten: &predicted,
                pole_pick: None,
                fastest_lap_pick: None,
            },
            &results_for(actual),
            &table,
        );

        assert_eq!(breakdown.podium_bonus, table.podium_any_order_bonus);
        assert_eq!(breakdown.partial_points, 3 * table.partial_credit);
        // P4..P10 still match exactly.
        assert_eq!(
            breakdown.position_points,
            (4..=10).map(|p| table.position_value(p)).sum::<i32>()
        );
        let podium_details = &breakdown.details[..3];
        assert!(podium_details
            .iter()
            .all(|d| matches!(d.outcome, PositionOutcome::Misplaced { .. })));
    }

    #[test]
    fn exact_and_any_order_podium_bonuses_are_mutually_exclusive() {
        let table = PointTable::default();
        let grid = full_grid();

        let exact = score_prediction(&picks(&grid), &results_for(full_grid()), &table);
        assert_eq!(exact.podium_bonus, table.podium_exact_bonus);

        let shuffled = drivers(&[
            "LEC", "VER", "NOR", "PIA", "SAI", "HAM", "RUS", "ALO", "GAS", "STR",
        ]);
        let any_order = score_prediction(
            &RankedPicks {
                top_ten: &shuffled,
                pole_pick: None,
                fastest_lap_pick: None,
            },
            &results_for(full_grid()),
            &table,
        );
        assert_eq!(any_order.podium_bonus, table.podium_any_order_bonus);
    }

    #[test]
    fn misplaced_driver_earns_partial_credit() {
        let predicted = drivers(&[
            "NOR", "VER", "LEC", "PIA", "SAI", "HAM", "RUS", "ALO", "GAS", "STR",
        ]);
        let table = PointTable::default();

        let breakdown = score_prediction(
            &RankedPicks {
                top_ten: &predicted,
                pole_pick: None,
                fastest_lap_pick: None,
            },
            &results_for(full_grid()),
            &table,
        );

        assert_eq!(
            breakdown.details[0].outcome,
            PositionOutcome::Misplaced { actual_position: 2 }
        );
        assert_eq!(
            breakdown.details[1].outcome,
            PositionOutcome::Misplaced { actual_position: 1 }
        );
        assert_eq!(breakdown.partial_points, 2 * table.partial_credit);
    }

    #[test]
    fn empty_slots_never_match_and_never_error() {
        let sparse = drivers(&["VER", "", "", "", "", "", "", "", "", ""]);
        let table = PointTable::default();

        let breakdown = score_prediction(
            &RankedPicks {
                top_ten: &sparse,
                pole_pick: None,
                fastest_lap_pick: None,
            },
            &results_for(full_grid()),
            &table,
        );

        assert_eq!(breakdown.position_points, table.position_value(1));
        assert_eq!(breakdown.partial_points, 0);
        assert_eq!(breakdown.podium_bonus, 0);
        assert_eq!(breakdown.details[1].predicted, None);
        assert_eq!(breakdown.details[1].outcome, PositionOutcome::Miss);
    }

    #[test]
    fn short_prediction_is_scored_without_panicking() {
        let short = drivers(&["VER", "NOR"]);
        let breakdown = score_prediction(
            &RankedPicks {
                top_ten: &short,
                pole_pick: None,
                fastest_lap_pick: None,
            },
            &results_for(full_grid()),
            &PointTable::default(),
        );

        assert_eq!(breakdown.details.len(), TOP_TEN_SLOTS);
        assert_eq!(breakdown.total_points, 25 + 18);
    }

    #[test]
    fn partial_results_prefix_only_scores_known_positions() {
        // Only a podium has been published so far.
        let partial = results_for(drivers(&["VER", "NOR", "LEC"]));
        let grid = full_grid();
        let table = PointTable::default();

        let breakdown = score_prediction(&picks(&grid), &partial, &table);

        assert_eq!(
            breakdown.position_points,
            (1..=3).map(|p| table.position_value(p)).sum::<i32>()
        );
        assert_eq!(breakdown.podium_bonus, table.podium_exact_bonus);
        assert!(breakdown.details[3..]
            .iter()
            .all(|d| d.outcome == PositionOutcome::Miss));
    }

    #[rstest]
    #[case(None, None, 0)]
    #[case(Some("VER"), None, 0)]
    #[case(Some("NOR"), Some("VER"), 0)]
    #[case(Some("VER"), Some("VER"), 10)]
    fn pole_bonus_requires_a_matching_pick(
        #[case] pick: Option<&str>,
        #[case] actual: Option<&str>,
        #[case] expected: i32,
    ) {
        let grid = full_grid();
        let results = RaceResults {
            positions: full_grid(),
            pole: actual.map(str::to_string),
            fastest_lap: None,
        };

        let breakdown = score_prediction(
            &RankedPicks {
                top_ten: &grid,
                pole_pick: pick,
                fastest_lap_pick: None,
            },
            &results,
            &PointTable::default(),
        );

        assert_eq!(breakdown.pole_points, expected);
    }

    #[test]
    fn scoring_is_deterministic() {
        let grid = drivers(&[
            "HAM", "VER", "NOR", "SAI", "LEC", "PIA", "RUS", "STR", "ALO", "GAS",
        ]);
        let results = results_for(full_grid());
        let table = PointTable::default();
        let picks = RankedPicks {
            top_ten: &grid,
            pole_pick: Some("VER"),
            fastest_lap_pick: Some("HAM"),
        };

        let first = score_prediction(&picks, &results, &table);
        let second = score_prediction(&picks, &results, &table);

        assert_eq!(first, second);
    }

    #[test]
    fn total_is_never_negative_and_never_exceeds_the_maximum() {
        let table = PointTable::default();
        let adversarial: Vec<Vec<String>> = vec![
            vec![],
            drivers(&["", "", "", "", "", "", "", "", "", ""]),
            drivers(&["XXX"; 10]),
            full_grid(),
        ];

        for top_ten in &adversarial {
            let breakdown = score_prediction(
                &RankedPicks {
                    top_ten,
                    pole_pick: Some("VER"),
                    fastest_lap_pick: Some("NOR"),
                },
                &results_for(full_grid()),
                &table,
            );
            assert!(breakdown.total_points >= 0);
            assert!(breakdown.total_points <= table.max_total());
        }
    }
}
