use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::model::structures::belief::Belief;

/// One row of the rating history: a single participation with its three
/// before/after belief pairs attached. Rows are created exactly once, in
/// game order, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRow {
    pub game_id: i64,
    pub player_id: i32,
    pub date: DateTime<FixedOffset>,
    pub region: String,
    pub team_id: i32,
    pub win: bool,
    pub performance_score: f64,
    pub serie_name: String,
    pub league_id: i32,
    pub contextual_before: Belief,
    pub contextual_after: Belief,
    pub meta_before: Belief,
    pub meta_after: Belief,
    pub overall_before: Belief,
    pub overall_after: Belief,
    /// Lower-bound scores of the overall pair, used for prediction and
    /// ranking respectively.
    pub overall_score_before: f64,
    pub overall_score_after: f64
}

impl RatingRow {
    /// True when the row's game moved its region's meta belief, i.e. the
    /// game was inter-region.
    pub fn meta_changed(&self) -> bool {
        self.meta_before != self.meta_after
    }
}
