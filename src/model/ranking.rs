use serde::Serialize;

use crate::{config::RankingConfig, model::history::RatingHistory};

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub player_id: i32,
    pub rank: usize,
    pub score: f64,
    pub games_played: usize
}

/// Builds the leaderboard from a finished rating history: players with
/// enough games whose latest appearance is at or after the cutoff, scored
/// by the lower bound of their latest overall rating, dense-ranked with
/// ties ordered by player id for determinism.
pub fn create_rankings(history: &RatingHistory, config: &RankingConfig) -> Vec<RankingEntry> {
    let mut candidates: Vec<(i32, f64, usize)> = history
        .player_ids()
        .filter_map(|player_id| {
            let games_played = history.games_played(player_id);
            if games_played < config.min_games {
                return None;
            }

            // The player's very last row decides both recency and score.
            let last = history.last_row_for_player(player_id)?;
            if last.date < config.since {
                return None;
            }

            Some((player_id, last.overall_score_after, games_played))
        })
        .collect();

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

    let mut entries: Vec<RankingEntry> = Vec::with_capacity(candidates.len());
    let mut rank = 0;
    let mut previous_score = f64::INFINITY;
    for (player_id, score, games_played) in candidates {
        if score < previous_score {
            rank += 1;
            previous_score = score;
        }

        entries.push(RankingEntry {
            player_id,
            rank,
            score,
            games_played
        });
    }

    entries
}
