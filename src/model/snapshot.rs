use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    config::RatingConfig,
    model::{
        combiner::fuse,
        constants::{FALLBACK_WINDOW_DAYS, OTHER_REGION},
        history::RatingHistory,
        structures::{belief::Belief, rating_row::RatingRow}
    }
};

/// One eligible player's refreshed rating inside a snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub player_id: i32,
    pub region: String,
    pub serie_name: String,
    pub contextual: Belief,
    pub meta: Belief,
    pub overall: Belief,
    pub score: f64
}

/// Best current estimate of every eligible player's overall rating for a
/// region as of a date. Read-only over the rating history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSnapshot {
    pub region: String,
    pub date: DateTime<FixedOffset>,
    /// True when no whitelisted series had occurred yet and the trailing
    /// window fallback selected the eligible players.
    pub used_fallback_window: bool,
    pub entries: Vec<SnapshotEntry>
}

/// Reconstructs "what was region R's effective rating distribution as of
/// date D". Eligibility comes from the region's most recent whitelisted
/// domestic series per league (or the trailing window before any series
/// has occurred); each eligible player's latest contextual rating is
/// re-fused with the region's *current* meta belief, deliberately
/// overriding whatever stale meta was baked into their last personal game.
pub fn region_snapshot(
    history: &RatingHistory,
    config: &RatingConfig,
    region: &str,
    date: DateTime<FixedOffset>
) -> RegionSnapshot {
    // Membership drifts over time: a player belongs to the region of
    // their most recent participation as of the query date.
    let members: Vec<i32> = history
        .player_ids()
        .filter(|&player_id| history.region_of_player_at(player_id, date) == Some(region))
        .sorted()
        .collect();

    let member_rows: Vec<&RatingRow> = members
        .iter()
        .flat_map(|&player_id| history.rows_for_player_until(player_id, date))
        .collect();

    let (eligible_rows, used_fallback_window) = eligible_rows(config, region, date, &member_rows);

    // Last eligible appearance decides each player's series tag.
    let mut series_of_player: IndexMap<i32, &str> = IndexMap::new();
    for row in &eligible_rows {
        series_of_player.insert(row.player_id, row.serie_name.as_str());
    }

    let meta = history.latest_meta_for_region(region, date).unwrap_or(config.prior());

    let entries = series_of_player
        .iter()
        .filter_map(|(&player_id, &serie_name)| {
            let contextual = history.latest_row_for_player(player_id, date)?.contextual_after;
            let overall = if config.use_meta_ratings {
                fuse(contextual, meta)
            } else {
                contextual
            };

            Some(SnapshotEntry {
                player_id,
                region: region.to_string(),
                serie_name: serie_name.to_string(),
                contextual,
                meta,
                overall,
                score: overall.lower_bound(config.lower_bound_k)
            })
        })
        .collect();

    RegionSnapshot {
        region: region.to_string(),
        date,
        used_fallback_window,
        entries
    }
}

/// Selects the rows deciding snapshot eligibility: per underlying league,
/// the most recent whitelisted series at or before the date; before any
/// whitelisted series has occurred (or for the unrated bucket), all rows
/// within the trailing window.
fn eligible_rows<'a>(
    config: &RatingConfig,
    region: &str,
    date: DateTime<FixedOffset>,
    member_rows: &[&'a RatingRow]
) -> (Vec<&'a RatingRow>, bool) {
    let whitelist = if region == OTHER_REGION {
        None
    } else {
        config.region_whitelist.get(region)
    };

    if let Some(whitelist) = whitelist {
        let whitelisted: Vec<&RatingRow> = member_rows
            .iter()
            .copied()
            .filter(|row| whitelist.contains(&row.serie_name))
            .collect();

        if !whitelisted.is_empty() {
            // Several leagues can feed one region; keep the latest series
            // of each.
            let mut latest_of_league: IndexMap<i32, (&str, DateTime<FixedOffset>)> = IndexMap::new();
            for row in &whitelisted {
                match latest_of_league.get(&row.league_id) {
                    Some(&(_, seen)) if seen > row.date => {}
                    _ => {
                        latest_of_league.insert(row.league_id, (row.serie_name.as_str(), row.date));
                    }
                }
            }
            let selected: HashSet<&str> = latest_of_league.values().map(|&(serie, _)| serie).collect();

            return (
                whitelisted
                    .into_iter()
                    .filter(|row| selected.contains(row.serie_name.as_str()))
                    .collect(),
                false
            );
        }
    }

    let window_start = date - Duration::days(FALLBACK_WINDOW_DAYS);
    (
        member_rows
            .iter()
            .copied()
            .filter(|row| row.date >= window_start)
            .collect(),
        true
    )
}

/// Number of inter-region games per series, i.e. games that moved a meta
/// belief. Reporting consumes this as a confidence/volume signal next to
/// the snapshot tables.
pub fn inter_region_game_counts(history: &RatingHistory) -> IndexMap<String, usize> {
    let mut games_of_serie: IndexMap<&str, HashSet<i64>> = IndexMap::new();
    for row in history.rows() {
        if row.meta_changed() {
            games_of_serie.entry(row.serie_name.as_str()).or_default().insert(row.game_id);
        }
    }

    games_of_serie
        .into_iter()
        .map(|(serie, games)| (serie.to_string(), games.len()))
        .collect()
}

/// Per-series regional report emitted for downstream charting.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRegionReport {
    pub serie_name: String,
    pub inter_region_games: usize,
    pub snapshots: Vec<RegionSnapshot>
}

/// Snapshots every region touched by each series with inter-region play,
/// as of that series' last inter-region game. Series are independent over
/// the finished history, so the sweep fans out across them.
pub fn region_ratings_after_series(history: &RatingHistory, config: &RatingConfig) -> Vec<SeriesRegionReport> {
    struct SerieSweep {
        games: HashSet<i64>,
        last_date: DateTime<FixedOffset>,
        regions: IndexSet<String>
    }

    let mut per_serie: IndexMap<String, SerieSweep> = IndexMap::new();
    for row in history.rows() {
        if row.meta_changed() {
            let sweep = per_serie.entry(row.serie_name.clone()).or_insert_with(|| SerieSweep {
                games: HashSet::new(),
                last_date: row.date,
                regions: IndexSet::new()
            });
            sweep.games.insert(row.game_id);
            // Rows are chronological; the last one wins.
            sweep.last_date = row.date;
            sweep.regions.insert(row.region.clone());
        }
    }

    let series: Vec<(String, usize, DateTime<FixedOffset>, IndexSet<String>)> = per_serie
        .into_iter()
        .map(|(serie_name, sweep)| (serie_name, sweep.games.len(), sweep.last_date, sweep.regions))
        .collect();

    series
        .into_par_iter()
        .map(|(serie_name, inter_region_games, date, regions)| SeriesRegionReport {
            snapshots: regions
                .iter()
                .map(|region| region_snapshot(history, config, region, date))
                .collect(),
            serie_name,
            inter_region_games
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        config::RatingConfig,
        model::engine::RatingEngine,
        utils::test_utils::{generate_series_game, parse_date}
    };

    /// Two Korean LCK games, one Korea/Europe international game, then one
    /// more LCK game. Korea players 1-5 and 11-15, Europe players 6-10.
    fn fixture() -> RatingHistory {
        let mut rows = Vec::new();
        rows.extend(generate_series_game(
            1,
            "2024-01-10T12:00:00+00:00",
            "LCK Spring",
            100,
            &[1, 2, 3, 4, 5],
            &[11, 12, 13, 14, 15],
            "Korea",
            "Korea",
            60.0,
            40.0
        ));
        rows.extend(generate_series_game(
            2,
            "2024-02-10T12:00:00+00:00",
            "LCK Spring",
            100,
            &[1, 2, 3, 4, 5],
            &[11, 12, 13, 14, 15],
            "Korea",
            "Korea",
            58.0,
            42.0
        ));
        rows.extend(generate_series_game(
            3,
            "2024-05-10T12:00:00+00:00",
            "MSI",
            900,
            &[1, 2, 3, 4, 5],
            &[6, 7, 8, 9, 10],
            "Korea",
            "Europe",
            65.0,
            35.0
        ));
        rows.extend(generate_series_game(
            4,
            "2024-06-10T12:00:00+00:00",
            "LCK Summer",
            100,
            &[1, 2, 3, 4, 5],
            &[11, 12, 13, 14, 15],
            "Korea",
            "Korea",
            55.0,
            45.0
        ));

        RatingEngine::new(RatingConfig::default())
            .unwrap()
            .process(&rows)
            .unwrap()
    }

    #[test]
    fn test_snapshot_selects_latest_whitelisted_series() {
        let history = fixture();
        let config = RatingConfig::default();

        let snapshot = region_snapshot(&history, &config, "Korea", parse_date("2024-07-01T00:00:00+00:00"));

        assert!(!snapshot.used_fallback_window);
        // Summer superseded Spring as the eligible series.
        assert!(snapshot.entries.iter().all(|e| e.serie_name == "LCK Summer"));
        let players: Vec<i32> = snapshot.entries.iter().map(|e| e.player_id).collect();
        assert_eq!(players, vec![1, 2, 3, 4, 5, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_snapshot_refreshes_meta_fusion() {
        let history = fixture();
        let config = RatingConfig::default();

        // Players 11-15 last played before the international game; their
        // baked-in overall used the prior meta, the snapshot re-fuses with
        // the post-international one.
        let date = parse_date("2024-05-20T00:00:00+00:00");
        let snapshot = region_snapshot(&history, &config, "Korea", date);
        let meta_now = history.latest_meta_for_region("Korea", date).unwrap();

        let entry = snapshot.entries.iter().find(|e| e.player_id == 11).unwrap();
        assert_eq!(entry.meta, meta_now);

        let baked = history.latest_row_for_player(11, date).unwrap();
        assert!(entry.meta != baked.meta_after);
        let refreshed = fuse(baked.contextual_after, meta_now);
        assert_abs_diff_eq!(entry.overall.mu, refreshed.mu, epsilon = 1e-12);
    }

    #[test]
    fn test_snapshot_cold_start_falls_back_to_window() {
        let history = fixture();
        let config = RatingConfig::default();

        // Europe has no whitelisted series in the fixture; the window
        // around the international game still yields its players.
        let snapshot = region_snapshot(&history, &config, "Europe", parse_date("2024-06-01T00:00:00+00:00"));

        assert!(snapshot.used_fallback_window);
        let players: Vec<i32> = snapshot.entries.iter().map(|e| e.player_id).collect();
        assert_eq!(players, vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_snapshot_empty_outside_fallback_window() {
        let history = fixture();
        let config = RatingConfig::default();

        let snapshot = region_snapshot(&history, &config, "Europe", parse_date("2026-01-01T00:00:00+00:00"));
        assert!(snapshot.used_fallback_window);
        assert!(snapshot.entries.is_empty());
    }

    #[test]
    fn test_inter_region_counts() {
        let history = fixture();
        let counts = inter_region_game_counts(&history);

        assert_eq!(counts.len(), 1);
        assert_eq!(counts["MSI"], 1);
    }

    #[test]
    fn test_after_series_report_covers_both_regions() {
        let history = fixture();
        let config = RatingConfig::default();

        let reports = region_ratings_after_series(&history, &config);
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.serie_name, "MSI");
        assert_eq!(report.inter_region_games, 1);

        let regions: Vec<&str> = report.snapshots.iter().map(|s| s.region.as_str()).collect();
        assert_eq!(regions, vec!["Korea", "Europe"]);
    }
}
