use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::warn;

use crate::{
    config::RatingConfig,
    data::structs::{group_by_game, verify_sort_contract, Participation},
    error::Result,
    model::{
        combiner::fuse,
        history::RatingHistory,
        meta::MetaRatingTracker,
        rater::{competition_ranks, RaterModel},
        structures::{belief::Belief, rating_row::RatingRow}
    },
    utils::progress_utils::progress_bar
};

/// Drives the rater over the chronologically ordered game stream,
/// maintaining the per-player contextual belief cursors and the per-region
/// meta cursors for one replay pass. The engine itself holds no state
/// across runs; every `process` call starts from fresh cursors.
pub struct RatingEngine {
    config: RatingConfig,
    rater: RaterModel
}

impl RatingEngine {
    pub fn new(config: RatingConfig) -> Result<RatingEngine> {
        config.validate()?;
        let rater = RaterModel::from_kind(config.rater_model, config.prior_sigma);

        Ok(RatingEngine { config, rater })
    }

    /// Replays the full participation stream and produces one rating
    /// history. The input must already be sorted by `(date, win desc)`;
    /// violations are fatal, never silently resorted.
    pub fn process(&self, participations: &[Participation]) -> Result<RatingHistory> {
        verify_sort_contract(participations)?;

        let games = group_by_game(participations);
        let prior = self.config.prior();

        let mut players: HashMap<i32, Belief> = HashMap::new();
        let mut meta = MetaRatingTracker::new(prior);
        let mut history = RatingHistory::with_capacity(participations.len());

        let bar = progress_bar(games.len() as u64, "Replaying game stream".to_string());
        for (game_id, row_indices) in &games {
            let rows: Vec<&Participation> = row_indices.iter().map(|&i| &participations[i]).collect();
            self.process_game(*game_id, &rows, &mut players, &mut meta, &mut history)?;
            bar.inc(1);
        }
        bar.finish();

        Ok(history)
    }

    /// Rates one game: snapshot `current` as `before`, update every
    /// co-participant with the rater, write `after`, advance the cursors.
    fn process_game(
        &self,
        game_id: i64,
        rows: &[&Participation],
        players: &mut HashMap<i32, Belief>,
        meta: &mut MetaRatingTracker,
        history: &mut RatingHistory
    ) -> Result<()> {
        let prior = self.config.prior();
        let befores: Vec<Belief> = rows
            .iter()
            .map(|p| players.get(&p.player_id).copied().unwrap_or(prior))
            .collect();

        let afters = if self.config.use_ffa_setting {
            self.rate_free_for_all(game_id, rows, &befores)?
        } else {
            self.rate_teams(game_id, rows, &befores)?
        };

        let Some(afters) = afters else {
            // Too few competitors; recoverable, already logged.
            return Ok(());
        };

        let meta_pairs = if self.config.use_meta_ratings {
            meta.observe_game(rows, &self.rater, self.config.use_ffa_setting)?
        } else {
            IndexMap::new()
        };

        let k = self.config.lower_bound_k;
        for ((participation, &contextual_before), &contextual_after) in rows.iter().zip(&befores).zip(&afters) {
            let (meta_before, meta_after) = meta_pairs
                .get(&participation.region)
                .copied()
                .unwrap_or_else(|| {
                    let current = meta.current(&participation.region);
                    (current, current)
                });

            let (overall_before, overall_after) = if self.config.use_meta_ratings {
                (fuse(contextual_before, meta_before), fuse(contextual_after, meta_after))
            } else {
                (contextual_before, contextual_after)
            };

            players.insert(participation.player_id, contextual_after);
            history.push(RatingRow {
                game_id,
                player_id: participation.player_id,
                date: participation.date,
                region: participation.region.clone(),
                team_id: participation.team_id,
                win: participation.win,
                performance_score: participation.performance_score,
                serie_name: participation.serie_name.clone(),
                league_id: participation.league_id,
                contextual_before,
                contextual_after,
                meta_before,
                meta_after,
                overall_before,
                overall_after,
                overall_score_before: overall_before.lower_bound(k),
                overall_score_after: overall_after.lower_bound(k)
            });
        }

        Ok(())
    }

    /// Free-for-all mode: every participant is its own competitor, ranked
    /// by performance score. Rewards individual excellence independently
    /// of the team outcome.
    fn rate_free_for_all(
        &self,
        game_id: i64,
        rows: &[&Participation],
        befores: &[Belief]
    ) -> Result<Option<Vec<Belief>>> {
        if rows.len() < 2 {
            warn!(game_id, competitors = rows.len(), "skipping game with fewer than two competitors");
            return Ok(None);
        }

        let scores: Vec<f64> = rows.iter().map(|p| p.performance_score).collect();
        let ranks = competition_ranks(&scores);
        let teams: Vec<Vec<Belief>> = befores.iter().map(|&b| vec![b]).collect();

        let rated = self.rater.rate(&teams, &ranks)?;

        Ok(Some(rated.into_iter().map(|team| team[0]).collect()))
    }

    /// Team mode: one competitor per side, ranked by the aggregate
    /// win/loss outcome; every member carries its own belief.
    fn rate_teams(&self, game_id: i64, rows: &[&Participation], befores: &[Belief]) -> Result<Option<Vec<Belief>>> {
        let mut sides: IndexMap<i32, Vec<usize>> = IndexMap::new();
        for (i, participation) in rows.iter().enumerate() {
            sides.entry(participation.team_id).or_default().push(i);
        }

        if sides.len() < 2 {
            warn!(game_id, competitors = sides.len(), "skipping game with fewer than two competitors");
            return Ok(None);
        }

        let outcomes: Vec<f64> = sides
            .values()
            .map(|members| {
                members.iter().map(|&i| rows[i].win as u8 as f64).sum::<f64>() / members.len() as f64
            })
            .collect();
        let ranks = competition_ranks(&outcomes);
        let teams: Vec<Vec<Belief>> = sides
            .values()
            .map(|members| members.iter().map(|&i| befores[i]).collect())
            .collect();

        let rated = self.rater.rate(&teams, &ranks)?;

        let mut afters = vec![Belief::new(0.0, 0.0); rows.len()];
        for (members, team) in sides.values().zip(rated) {
            for (&i, belief) in members.iter().zip(team) {
                afters[i] = belief;
            }
        }

        Ok(Some(afters))
    }
}
