use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{
    data::structs::{verify_sort_contract, Participation},
    error::{ProcessorError, Result}
};

/// One participation with its smoothed-score rating pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EwmaRow {
    pub game_id: i64,
    pub player_id: i32,
    pub date: DateTime<FixedOffset>,
    pub rating_before: f64,
    pub rating_after: f64
}

/// Exponentially-weighted moving average of performance scores, the
/// baseline the belief-update engine is evaluated against. The cursor is
/// seeded at a player's first observed score, so the first row carries a
/// zero delta regardless of score scale.
pub fn compute_ewma_ratings(participations: &[Participation], alpha: f64) -> Result<Vec<EwmaRow>> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(ProcessorError::InvalidAlpha(alpha));
    }
    verify_sort_contract(participations)?;

    let mut cursors: HashMap<i32, f64> = HashMap::new();
    let rows = participations
        .iter()
        .map(|participation| {
            let before = cursors
                .get(&participation.player_id)
                .copied()
                .unwrap_or(participation.performance_score);
            let after = alpha * participation.performance_score + (1.0 - alpha) * before;
            cursors.insert(participation.player_id, after);

            EwmaRow {
                game_id: participation.game_id,
                player_id: participation.player_id,
                date: participation.date,
                rating_before: before,
                rating_after: after
            }
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::utils::test_utils::generate_participation;

    #[test]
    fn test_first_game_seeds_cursor() {
        let rows = vec![generate_participation(1, 1, "2024-01-01T12:00:00+00:00", "Korea", 1, true, 62.0)];
        let ratings = compute_ewma_ratings(&rows, 0.05).unwrap();

        assert_abs_diff_eq!(ratings[0].rating_before, 62.0);
        assert_abs_diff_eq!(ratings[0].rating_after, 62.0);
    }

    #[test]
    fn test_smoothing_moves_toward_new_score() {
        let rows = vec![
            generate_participation(1, 1, "2024-01-01T12:00:00+00:00", "Korea", 1, true, 50.0),
            generate_participation(2, 1, "2024-01-02T12:00:00+00:00", "Korea", 1, true, 70.0),
        ];
        let ratings = compute_ewma_ratings(&rows, 0.1).unwrap();

        assert_abs_diff_eq!(ratings[1].rating_before, 50.0);
        assert_abs_diff_eq!(ratings[1].rating_after, 0.1 * 70.0 + 0.9 * 50.0);
    }

    #[test]
    fn test_invalid_alpha_is_fatal() {
        for alpha in [0.0, -0.1, 1.01] {
            let result = compute_ewma_ratings(&[], alpha);
            assert!(matches!(result, Err(ProcessorError::InvalidAlpha(a)) if a == alpha));
        }
    }

    #[test]
    fn test_sort_contract_enforced() {
        let rows = vec![
            generate_participation(1, 1, "2024-01-02T12:00:00+00:00", "Korea", 1, true, 50.0),
            generate_participation(2, 1, "2024-01-01T12:00:00+00:00", "Korea", 1, true, 70.0),
        ];

        assert!(matches!(
            compute_ewma_ratings(&rows, 0.05),
            Err(ProcessorError::UnsortedInput { .. })
        ));
    }
}
