use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    data::structs::Participation,
    error::Result,
    model::{
        rater::{competition_ranks, RaterModel},
        structures::belief::Belief
    }
};

/// Maintains one evolving belief per region, advanced only by games whose
/// participants span more than one region. Cursors live for exactly one
/// replay pass; the tracker is never shared across runs.
pub struct MetaRatingTracker {
    prior: Belief,
    current: HashMap<String, Belief>
}

impl MetaRatingTracker {
    pub fn new(prior: Belief) -> MetaRatingTracker {
        MetaRatingTracker {
            prior,
            current: HashMap::new()
        }
    }

    /// The region's current belief; regions not yet seen in an
    /// inter-region game sit at the default prior.
    pub fn current(&self, region: &str) -> Belief {
        self.current.get(region).copied().unwrap_or(self.prior)
    }

    /// Advances the tracker with one game and returns the before/after
    /// belief pair per involved region, in first-appearance order. For an
    /// intra-region game every pair is `(current, current)` and nothing
    /// moves.
    pub fn observe_game(
        &mut self,
        participations: &[&Participation],
        rater: &RaterModel,
        use_ffa_setting: bool
    ) -> Result<IndexMap<String, (Belief, Belief)>> {
        let mut regions: IndexMap<&str, Vec<&Participation>> = IndexMap::new();
        for &participation in participations {
            regions.entry(participation.region.as_str()).or_default().push(participation);
        }

        if regions.len() < 2 {
            return Ok(regions
                .keys()
                .map(|&region| {
                    let belief = self.current(region);
                    (region.to_string(), (belief, belief))
                })
                .collect());
        }

        // One pseudo-competitor per region, aggregated the same way the
        // player-level update is driven: by performance score in
        // free-for-all mode, by the team outcome otherwise.
        let aggregates: Vec<f64> = regions
            .values()
            .map(|members| {
                let values = members.iter().map(|p| {
                    if use_ffa_setting {
                        p.performance_score
                    } else {
                        p.win as u8 as f64
                    }
                });
                let count = members.len() as f64;
                values.sum::<f64>() / count
            })
            .collect();

        let ranks = competition_ranks(&aggregates);
        let befores: Vec<Belief> = regions.keys().map(|&region| self.current(region)).collect();
        let teams: Vec<Vec<Belief>> = befores.iter().map(|&belief| vec![belief]).collect();

        let rated = rater.rate(&teams, &ranks)?;

        let pairs = regions
            .keys()
            .zip_eq(befores.iter().zip(&rated))
            .map(|(&region, (&before, after))| {
                let after = after[0];
                self.current.insert(region.to_string(), after);
                (region.to_string(), (before, after))
            })
            .collect();

        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{
            constants::{DEFAULT_MU, DEFAULT_SIGMA},
            structures::rater_kind::RaterKind
        },
        utils::test_utils::generate_participation
    };

    fn tracker() -> MetaRatingTracker {
        MetaRatingTracker::new(Belief::new(DEFAULT_MU, DEFAULT_SIGMA))
    }

    fn rater() -> RaterModel {
        RaterModel::from_kind(RaterKind::RankBased, DEFAULT_SIGMA)
    }

    #[test]
    fn test_intra_region_game_leaves_meta_untouched() {
        let mut tracker = tracker();
        let rows = vec![
            generate_participation(1, 1, "2024-01-01T12:00:00+00:00", "Korea", 1, true, 70.0),
            generate_participation(1, 2, "2024-01-01T12:00:00+00:00", "Korea", 2, false, 30.0),
        ];
        let refs: Vec<&_> = rows.iter().collect();

        let pairs = tracker.observe_game(&refs, &rater(), true).unwrap();

        assert_eq!(pairs.len(), 1);
        let (before, after) = pairs["Korea"];
        assert_eq!(before, after);
        assert_eq!(tracker.current("Korea"), Belief::new(DEFAULT_MU, DEFAULT_SIGMA));
    }

    #[test]
    fn test_inter_region_game_moves_both_regions_only() {
        let mut tracker = tracker();
        let rows = vec![
            generate_participation(1, 1, "2024-10-01T12:00:00+00:00", "Korea", 1, true, 80.0),
            generate_participation(1, 2, "2024-10-01T12:00:00+00:00", "Korea", 1, true, 75.0),
            generate_participation(1, 3, "2024-10-01T12:00:00+00:00", "Korea", 1, true, 70.0),
            generate_participation(1, 4, "2024-10-01T12:00:00+00:00", "Europe", 2, false, 40.0),
            generate_participation(1, 5, "2024-10-01T12:00:00+00:00", "Europe", 2, false, 35.0),
        ];
        let refs: Vec<&_> = rows.iter().collect();

        let pairs = tracker.observe_game(&refs, &rater(), true).unwrap();

        assert_eq!(pairs.len(), 2);
        let (korea_before, korea_after) = pairs["Korea"];
        let (europe_before, europe_after) = pairs["Europe"];

        assert!(korea_after.mu > korea_before.mu);
        assert!(europe_after.mu < europe_before.mu);
        assert!(korea_after.sigma < korea_before.sigma);

        // A region not in the game stays at its prior.
        assert_eq!(tracker.current("China"), Belief::new(DEFAULT_MU, DEFAULT_SIGMA));
    }

    #[test]
    fn test_team_mode_aggregates_by_win_rate() {
        let mut tracker = tracker();
        // Europe wins despite lower performance scores; in team mode the
        // outcome drives the region ranking.
        let rows = vec![
            generate_participation(1, 1, "2024-10-01T12:00:00+00:00", "Europe", 1, true, 20.0),
            generate_participation(1, 2, "2024-10-01T12:00:00+00:00", "Korea", 2, false, 90.0),
        ];
        let refs: Vec<&_> = rows.iter().collect();

        let pairs = tracker.observe_game(&refs, &rater(), false).unwrap();

        let (_, europe_after) = pairs["Europe"];
        let (_, korea_after) = pairs["Korea"];
        assert!(europe_after.mu > korea_after.mu);
    }

    #[test]
    fn test_cold_start_uses_prior_without_failing() {
        let mut tracker = tracker();
        let rows = vec![
            generate_participation(1, 1, "2024-10-01T12:00:00+00:00", "Brazil", 1, true, 60.0),
            generate_participation(1, 2, "2024-10-01T12:00:00+00:00", "Vietnam", 2, false, 40.0),
        ];
        let refs: Vec<&_> = rows.iter().collect();

        let pairs = tracker.observe_game(&refs, &rater(), true).unwrap();

        let (brazil_before, _) = pairs["Brazil"];
        assert_eq!(brazil_before, Belief::new(DEFAULT_MU, DEFAULT_SIGMA));
    }
}
