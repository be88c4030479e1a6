use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ProcessorError, Result};

/// One player's presence in one game, identified by `(game_id, player_id)`.
/// Immutable once ingested. The performance score is computed upstream by
/// the performance-score pipeline; this processor only consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participation {
    pub game_id: i64,
    pub player_id: i32,
    pub date: DateTime<FixedOffset>,
    pub region: String,
    pub team_id: i32,
    pub win: bool,
    pub performance_score: f64,
    /// Series metadata consumed by the snapshot retriever. Optional in the
    /// input table; rows without it still rate normally.
    #[serde(default)]
    pub serie_name: String,
    #[serde(default)]
    pub league_id: i32
}

impl Participation {
    /// The required input ordering: date ascending, winners first on ties.
    pub fn sort_key(&self) -> (DateTime<FixedOffset>, bool) {
        (self.date, !self.win)
    }
}

/// Fails fast if the input table violates its sort contract. The engine
/// never resorts silently.
pub fn verify_sort_contract(participations: &[Participation]) -> Result<()> {
    for (i, pair) in participations.windows(2).enumerate() {
        if pair[0].sort_key() > pair[1].sort_key() {
            return Err(ProcessorError::UnsortedInput { position: i + 1 });
        }
    }

    Ok(())
}

/// Groups row indices by game in first-appearance order. Rows of a game are
/// not necessarily contiguous when several games share a timestamp, so the
/// grouping collects by id rather than splitting runs.
pub fn group_by_game(participations: &[Participation]) -> IndexMap<i64, Vec<usize>> {
    let mut games: IndexMap<i64, Vec<usize>> = IndexMap::new();
    for (i, participation) in participations.iter().enumerate() {
        games.entry(participation.game_id).or_default().push(i);
    }

    games
}
