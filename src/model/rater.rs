use std::cmp::Ordering;

use openskill::{
    model::{model::Model, plackett_luce::PlackettLuce},
    rating::{default_gamma, Rating}
};
use skillratings::{
    trueskill::{trueskill_multi_team, TrueSkillConfig, TrueSkillRating},
    MultiTeamOutcome
};

use crate::{
    error::{ProcessorError, Result},
    model::{constants::KAPPA, structures::{belief::Belief, rater_kind::RaterKind}}
};

/// Pure rating function: given the competitors' current beliefs and their
/// observed ranking, returns updated beliefs. The two backends are
/// interchangeable; both are driven through the same team/rank shape
/// regardless of team or free-for-all mode.
pub enum RaterModel {
    /// Pairwise factor-graph update. Dynamics are pinned to zero so
    /// deviations never widen between games; the draw probability stays at
    /// the factor graph's standard 0.1 so exact ties keep a well-defined
    /// (and mean-preserving) update.
    Pairwise(TrueSkillConfig),
    /// Multi-competitor weighted-rank update over expected rank
    /// probabilities.
    RankBased(PlackettLuce)
}

impl RaterModel {
    pub fn from_kind(kind: RaterKind, prior_sigma: f64) -> RaterModel {
        let beta = prior_sigma / 2.0;
        match kind {
            RaterKind::RankBased => RaterModel::RankBased(PlackettLuce::new(beta, KAPPA, default_gamma)),
            RaterKind::Pairwise => RaterModel::Pairwise(TrueSkillConfig {
                draw_probability: 0.1,
                beta,
                default_dynamics: 0.0
            })
        }
    }

    /// Rates one event. `teams[i]` holds the current beliefs of competitor
    /// `i`'s members and `ranks[i]` its observed placement (1 = best, equal
    /// ranks denote a tie). Returns updated beliefs in the same shape.
    pub fn rate(&self, teams: &[Vec<Belief>], ranks: &[usize]) -> Result<Vec<Vec<Belief>>> {
        if teams.len() != ranks.len() {
            return Err(ProcessorError::CompetitorRankMismatch {
                teams: teams.len(),
                ranks: ranks.len()
            });
        }

        let rated = match self {
            RaterModel::RankBased(model) => {
                let input: Vec<Vec<Rating>> = teams
                    .iter()
                    .map(|team| {
                        team.iter()
                            .map(|b| Rating {
                                mu: b.mu,
                                sigma: b.sigma
                            })
                            .collect()
                    })
                    .collect();

                model
                    .rate(input, ranks.to_vec())
                    .into_iter()
                    .map(|team| team.into_iter().map(|r| Belief::new(r.mu, r.sigma).floored()).collect())
                    .collect()
            }
            RaterModel::Pairwise(config) => {
                let input: Vec<Vec<TrueSkillRating>> = teams
                    .iter()
                    .map(|team| {
                        team.iter()
                            .map(|b| TrueSkillRating {
                                rating: b.mu,
                                uncertainty: b.sigma
                            })
                            .collect()
                    })
                    .collect();

                let teams_and_ranks: Vec<(&[TrueSkillRating], MultiTeamOutcome)> = input
                    .iter()
                    .zip(ranks)
                    .map(|(team, rank)| (team.as_slice(), MultiTeamOutcome::new(*rank)))
                    .collect();

                trueskill_multi_team(&teams_and_ranks, config)
                    .into_iter()
                    .map(|team| {
                        team.into_iter()
                            .map(|r| Belief::new(r.rating, r.uncertainty).floored())
                            .collect()
                    })
                    .collect()
            }
        };

        Ok(rated)
    }
}

/// Standard competition ranking over aggregate values, descending: the
/// highest value gets rank 1, ties share a rank and the following
/// competitor skips past them (1, 2, 2, 4).
pub fn competition_ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut ranks = vec![0; values.len()];
    for (position, &i) in order.iter().enumerate() {
        ranks[i] = if position > 0 && values[i] == values[order[position - 1]] {
            ranks[order[position - 1]]
        } else {
            position + 1
        };
    }

    ranks
}
