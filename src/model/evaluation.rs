use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::{
    config::EvaluationConfig,
    error::{ProcessorError, Result},
    model::history::RatingHistory
};

/// Scores of the win-probability estimator derived from the rating
/// history, computed over the post-warm-up window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub n_games: usize,
    pub accuracy: f64,
    pub f1: f64,
    pub auc: f64,
    pub expected_calibration_error: f64
}

/// Probability that `side` beats `opponent` given their scalar ratings:
/// logistic link over the rating difference, scaled by the configured
/// uncertainty constant.
pub fn win_probability(side: f64, opponent: f64, scale: f64) -> f64 {
    1.0 / (1.0 + (-(side - opponent) / scale).exp())
}

/// Evaluates the rating history as a game-outcome predictor. One sample
/// per two-sided game after the warm-up window: the probability that the
/// side with the smaller team id wins, predicted from pre-game overall
/// scores, scored against the observed outcome.
pub fn evaluate(history: &RatingHistory, config: &EvaluationConfig) -> Result<EvaluationReport> {
    config.validate()?;

    let mut probabilities = Vec::new();
    let mut outcomes = Vec::new();

    for (game_id, indices) in history.games() {
        let rows: Vec<_> = indices.iter().map(|&i| &history.rows()[i]).collect();
        // Warm-up games carry cold-start noise; hold them out.
        if rows.first().map_or(true, |row| row.date <= config.end_warmup_date) {
            continue;
        }

        let mut sides: IndexMap<i32, (f64, usize, bool)> = IndexMap::new();
        for row in &rows {
            let side = sides.entry(row.team_id).or_insert((0.0, 0, row.win));
            side.0 += row.overall_score_before;
            side.1 += 1;
        }

        if sides.len() != 2 {
            warn!(game_id, sides = sides.len(), "skipping game without exactly two sides");
            continue;
        }

        sides.sort_keys();
        let ratings: Vec<f64> = sides.values().map(|&(sum, count, _)| sum / count as f64).collect();
        let subject_won = sides.values().next().map(|&(_, _, win)| win).unwrap_or(false);

        probabilities.push(win_probability(ratings[0], ratings[1], config.win_probability_scale));
        outcomes.push(subject_won);
    }

    if probabilities.is_empty() {
        return Err(ProcessorError::EmptyHistory);
    }

    Ok(EvaluationReport {
        n_games: probabilities.len(),
        accuracy: accuracy(&outcomes, &probabilities),
        f1: f1(&outcomes, &probabilities),
        auc: roc_auc(&outcomes, &probabilities),
        expected_calibration_error: expected_calibration_error(&outcomes, &probabilities, config.calibration_bins)
    })
}

fn accuracy(outcomes: &[bool], probabilities: &[f64]) -> f64 {
    let correct = outcomes
        .iter()
        .zip(probabilities)
        .filter(|&(&won, &p)| (p > 0.5) == won)
        .count();

    correct as f64 / outcomes.len() as f64
}

fn f1(outcomes: &[bool], probabilities: &[f64]) -> f64 {
    let mut true_positives = 0usize;
    let mut false_positives = 0usize;
    let mut false_negatives = 0usize;

    for (&won, &p) in outcomes.iter().zip(probabilities) {
        match (p > 0.5, won) {
            (true, true) => true_positives += 1,
            (true, false) => false_positives += 1,
            (false, true) => false_negatives += 1,
            (false, false) => {}
        }
    }

    let denominator = 2 * true_positives + false_positives + false_negatives;
    if denominator == 0 {
        return 0.0;
    }

    2.0 * true_positives as f64 / denominator as f64
}

/// Rank statistic (Mann-Whitney) with midranks for tied probabilities.
fn roc_auc(outcomes: &[bool], probabilities: &[f64]) -> f64 {
    let n = outcomes.len();
    let positives = outcomes.iter().filter(|&&won| won).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        probabilities[a]
            .partial_cmp(&probabilities[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && probabilities[order[j + 1]] == probabilities[order[i]] {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        for &index in &order[i..=j] {
            ranks[index] = midrank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = outcomes
        .iter()
        .zip(&ranks)
        .filter(|&(&won, _)| won)
        .map(|(_, &rank)| rank)
        .sum();

    (positive_rank_sum - (positives * (positives + 1)) as f64 / 2.0) / (positives * negatives) as f64
}

/// Expected calibration error: per fixed-width probability bucket, the
/// gap between predicted and observed positive rate, weighted by bucket
/// occupancy.
fn expected_calibration_error(outcomes: &[bool], probabilities: &[f64], bins: usize) -> f64 {
    let bins = bins.max(1);
    let mut counts = vec![0usize; bins];
    let mut probability_sums = vec![0.0; bins];
    let mut positive_counts = vec![0usize; bins];

    for (&won, &p) in outcomes.iter().zip(probabilities) {
        let bin = ((p * bins as f64) as usize).min(bins - 1);
        counts[bin] += 1;
        probability_sums[bin] += p;
        positive_counts[bin] += won as usize;
    }

    let total = outcomes.len() as f64;
    (0..bins)
        .filter(|&bin| counts[bin] > 0)
        .map(|bin| {
            let count = counts[bin] as f64;
            let mean_probability = probability_sums[bin] / count;
            let positive_rate = positive_counts[bin] as f64 / count;
            (count / total) * (mean_probability - positive_rate).abs()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        config::RatingConfig,
        model::engine::RatingEngine,
        utils::test_utils::{generate_team_game, parse_date}
    };

    #[test]
    fn test_win_probability_link() {
        assert_abs_diff_eq!(win_probability(10.0, 10.0, 1.0), 0.5);
        assert!(win_probability(12.0, 10.0, 1.0) > 0.5);
        assert!(win_probability(8.0, 10.0, 1.0) < 0.5);
        // A larger scale flattens the link toward a coin flip.
        assert!(win_probability(12.0, 10.0, 10.0) < win_probability(12.0, 10.0, 1.0));
    }

    #[test]
    fn test_roc_auc_perfect_and_inverted() {
        let outcomes = [true, true, false, false];
        assert_abs_diff_eq!(roc_auc(&outcomes, &[0.9, 0.8, 0.2, 0.1]), 1.0);
        assert_abs_diff_eq!(roc_auc(&outcomes, &[0.1, 0.2, 0.8, 0.9]), 0.0);
        assert_abs_diff_eq!(roc_auc(&outcomes, &[0.5, 0.5, 0.5, 0.5]), 0.5);
    }

    #[test]
    fn test_f1_degenerate_cases() {
        assert_abs_diff_eq!(f1(&[false, false], &[0.1, 0.2]), 0.0);
        assert_abs_diff_eq!(f1(&[true, true], &[0.9, 0.8]), 1.0);
    }

    #[test]
    fn test_calibration_of_perfectly_calibrated_bins() {
        // Every 0.7 prediction comes true 70% of the time, at the bin's
        // mean; the error collapses to zero.
        let outcomes = [true, true, true, true, true, true, true, false, false, false];
        let probabilities = [0.7; 10];
        assert_abs_diff_eq!(expected_calibration_error(&outcomes, &probabilities, 10), 0.0, epsilon = 1e-12);

        let overconfident = [0.99; 10];
        assert!(expected_calibration_error(&outcomes, &overconfident, 10) > 0.2);
    }

    #[test]
    fn test_evaluate_holds_out_warmup_window() {
        let mut rows = Vec::new();
        for game in 0..6 {
            let date = format!("2024-0{}-01T12:00:00+00:00", game + 1);
            rows.extend(generate_team_game(game, &date, "Korea", "Korea", 60.0, 40.0));
        }

        let history = RatingEngine::new(RatingConfig::default()).unwrap().process(&rows).unwrap();

        let config = EvaluationConfig {
            start_warmup_date: parse_date("2024-01-01T00:00:00+00:00"),
            end_warmup_date: parse_date("2024-03-15T00:00:00+00:00"),
            ..EvaluationConfig::default()
        };
        let report = evaluate(&history, &config).unwrap();

        // Games 1-3 fall inside the warm-up window.
        assert_eq!(report.n_games, 3);
        assert!(report.accuracy >= 0.0 && report.accuracy <= 1.0);
        assert!(report.expected_calibration_error >= 0.0);
    }

    #[test]
    fn test_evaluate_empty_window_is_an_error() {
        let rows = generate_team_game(1, "2024-01-01T12:00:00+00:00", "Korea", "Korea", 60.0, 40.0);
        let history = RatingEngine::new(RatingConfig::default()).unwrap().process(&rows).unwrap();

        let config = EvaluationConfig {
            start_warmup_date: parse_date("2024-01-01T00:00:00+00:00"),
            end_warmup_date: parse_date("2025-01-01T00:00:00+00:00"),
            ..EvaluationConfig::default()
        };

        assert!(matches!(evaluate(&history, &config), Err(ProcessorError::EmptyHistory)));
    }
}
