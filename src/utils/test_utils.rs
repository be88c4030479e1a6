use chrono::{DateTime, Duration, FixedOffset};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    data::structs::Participation,
    model::structures::{belief::Belief, rating_row::RatingRow}
};

pub fn parse_date(date: &str) -> DateTime<FixedOffset> {
    date.parse().expect("test date must be RFC 3339")
}

pub fn generate_participation(
    game_id: i64,
    player_id: i32,
    date: &str,
    region: &str,
    team_id: i32,
    win: bool,
    performance_score: f64
) -> Participation {
    Participation {
        game_id,
        player_id,
        date: parse_date(date),
        region: region.to_string(),
        team_id,
        win,
        performance_score,
        serie_name: String::new(),
        league_id: 0
    }
}

/// A full 5v5 game between fixed rosters: players 1-5 on team 1 (the
/// winners, listed first to satisfy the sort contract) and players 6-10 on
/// team 2. Per-player scores fan out below each side's base score.
pub fn generate_team_game(
    game_id: i64,
    date: &str,
    region_a: &str,
    region_b: &str,
    score_a: f64,
    score_b: f64
) -> Vec<Participation> {
    generate_series_game(
        game_id,
        date,
        "",
        0,
        &[1, 2, 3, 4, 5],
        &[6, 7, 8, 9, 10],
        region_a,
        region_b,
        score_a,
        score_b
    )
}

/// Like [`generate_team_game`] with explicit rosters and series metadata.
/// Side A always wins.
#[allow(clippy::too_many_arguments)]
pub fn generate_series_game(
    game_id: i64,
    date: &str,
    serie_name: &str,
    league_id: i32,
    players_a: &[i32],
    players_b: &[i32],
    region_a: &str,
    region_b: &str,
    score_a: f64,
    score_b: f64
) -> Vec<Participation> {
    let side = |players: &[i32], team_id: i32, region: &str, win: bool, base: f64| {
        players
            .iter()
            .enumerate()
            .map(|(i, &player_id)| Participation {
                game_id,
                player_id,
                date: parse_date(date),
                region: region.to_string(),
                team_id,
                win,
                performance_score: base - i as f64,
                serie_name: serie_name.to_string(),
                league_id
            })
            .collect::<Vec<_>>()
    };

    let mut rows = side(players_a, 1, region_a, true, score_a);
    rows.extend(side(players_b, 2, region_b, false, score_b));

    rows
}

/// A bare history row whose overall scores equal `mu`, for exercising the
/// read-only consumers without running the engine.
pub fn generate_rating_row(game_id: i64, player_id: i32, date: &str, region: &str, mu: f64) -> RatingRow {
    let belief = Belief::new(mu, 1.0);

    RatingRow {
        game_id,
        player_id,
        date: parse_date(date),
        region: region.to_string(),
        team_id: 1,
        win: true,
        performance_score: mu,
        serie_name: String::new(),
        league_id: 0,
        contextual_before: belief,
        contextual_after: belief,
        meta_before: belief,
        meta_after: belief,
        overall_before: belief,
        overall_after: belief,
        overall_score_before: mu,
        overall_score_after: mu
    }
}

/// A reproducible multi-month stream of 5v5 games across two regions with
/// occasional inter-region games. Seeded, so replays are comparable.
pub fn generate_random_stream(n_games: usize, seed: u64) -> Vec<Participation> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let start = parse_date("2024-01-01T12:00:00+00:00");

    let mut rows = Vec::with_capacity(n_games * 10);
    for game in 0..n_games {
        let date = (start + Duration::hours(game as i64 * 6)).to_rfc3339();
        let inter_region = game % 7 == 0;
        let (region_a, region_b) = if inter_region {
            ("Korea", "Europe")
        } else if game % 2 == 0 {
            ("Korea", "Korea")
        } else {
            ("Europe", "Europe")
        };

        let score_a: f64 = rng.random_range(40.0..80.0);
        let score_b: f64 = rng.random_range(20.0..60.0);
        rows.extend(generate_team_game(game as i64, &date, region_a, region_b, score_a, score_b));
    }

    rows
}
