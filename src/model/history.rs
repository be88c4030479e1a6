use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::structures::{belief::Belief, rating_row::RatingRow};

/// Append-only, chronologically ordered table of all participations with
/// their rating pairs attached. Produced by exactly one replay pass and
/// shared read-only afterwards.
///
/// Secondary indices answer the repeated "as of date" lookups (last known
/// region, latest contextual rating, latest meta belief) by binary search
/// over per-key row lists instead of rescanning the table.
#[derive(Default, Serialize)]
#[serde(transparent)]
pub struct RatingHistory {
    rows: Vec<RatingRow>,
    #[serde(skip)]
    player_rows: HashMap<i32, Vec<usize>>,
    #[serde(skip)]
    region_rows: HashMap<String, Vec<usize>>,
    #[serde(skip)]
    game_rows: IndexMap<i64, Vec<usize>>
}

impl RatingHistory {
    pub fn new() -> RatingHistory {
        RatingHistory::default()
    }

    pub fn with_capacity(capacity: usize) -> RatingHistory {
        RatingHistory {
            rows: Vec::with_capacity(capacity),
            ..RatingHistory::default()
        }
    }

    /// Appends one row. Rows arrive in game-processing order, so every
    /// per-key index list stays sorted by date for free.
    pub fn push(&mut self, row: RatingRow) {
        let index = self.rows.len();
        self.player_rows.entry(row.player_id).or_default().push(index);
        self.region_rows.entry(row.region.clone()).or_default().push(index);
        self.game_rows.entry(row.game_id).or_default().push(index);
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[RatingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.player_rows.keys().copied()
    }

    pub fn games(&self) -> impl Iterator<Item = (i64, &Vec<usize>)> {
        self.game_rows.iter().map(|(&game_id, rows)| (game_id, rows))
    }

    pub fn games_played(&self, player_id: i32) -> usize {
        self.player_rows.get(&player_id).map_or(0, Vec::len)
    }

    /// The player's final row in the history.
    pub fn last_row_for_player(&self, player_id: i32) -> Option<&RatingRow> {
        let indices = self.player_rows.get(&player_id)?;

        indices.last().map(|&i| &self.rows[i])
    }

    /// The player's most recent row at or before `date`.
    pub fn latest_row_for_player(&self, player_id: i32, date: DateTime<FixedOffset>) -> Option<&RatingRow> {
        let indices = self.player_rows.get(&player_id)?;
        let cut = indices.partition_point(|&i| self.rows[i].date <= date);

        cut.checked_sub(1).map(|i| &self.rows[indices[i]])
    }

    /// The player's last known region as of `date`: the region of their
    /// most recent participation at or before it.
    pub fn region_of_player_at(&self, player_id: i32, date: DateTime<FixedOffset>) -> Option<&str> {
        self.latest_row_for_player(player_id, date).map(|row| row.region.as_str())
    }

    /// The region's effective meta belief as of `date`. Meta changes only
    /// happen through games the region's players appear in, so the latest
    /// row of the region carries its current belief.
    pub fn latest_meta_for_region(&self, region: &str, date: DateTime<FixedOffset>) -> Option<Belief> {
        let indices = self.region_rows.get(region)?;
        let cut = indices.partition_point(|&i| self.rows[i].date <= date);

        cut.checked_sub(1).map(|i| self.rows[indices[i]].meta_after)
    }

    /// Rows of `player_id` at or before `date`, oldest first.
    pub fn rows_for_player_until(
        &self,
        player_id: i32,
        date: DateTime<FixedOffset>
    ) -> impl Iterator<Item = &RatingRow> {
        self.player_rows
            .get(&player_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.rows[i])
            .take_while(move |row| row.date <= date)
    }
}
