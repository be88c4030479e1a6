use std::{
    fs,
    io::BufWriter,
    path::Path
};

use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use esr_processor::{
    args::Args,
    config::{Config, Method},
    data::{load_participations, structs::Participation},
    error::{ProcessorError, Result},
    model::{
        engine::RatingEngine,
        evaluation::evaluate,
        ewma::compute_ewma_ratings,
        ranking::create_rankings,
        snapshot::region_ratings_after_series
    }
};

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default()
    };

    let participations = load_participations(&args.input)?;
    info!(rows = participations.len(), "loaded participation table");

    fs::create_dir_all(&args.output_dir)?;

    match config.method {
        Method::Bayesian => run_bayesian(&args, &config, &participations),
        Method::Ewma => run_ewma(&args, &config, &participations)
    }
}

fn run_bayesian(args: &Args, config: &Config, participations: &[Participation]) -> Result<()> {
    let engine = RatingEngine::new(config.rating.clone())?;
    let history = engine.process(participations)?;
    info!(rows = history.len(), "rating history produced");
    write_json(&args.output_dir.join("player_ratings.json"), &history)?;

    let rankings = create_rankings(&history, &config.ranking);
    info!(players = rankings.len(), "rankings created");
    write_json(&args.output_dir.join("rankings.json"), &rankings)?;

    let region_reports = region_ratings_after_series(&history, &config.rating);
    write_json(&args.output_dir.join("region_series_ratings.json"), &region_reports)?;

    match evaluate(&history, &config.evaluation) {
        Ok(report) => {
            info!(
                n_games = report.n_games,
                accuracy = report.accuracy,
                f1 = report.f1,
                auc = report.auc,
                ece = report.expected_calibration_error,
                "win-probability evaluation"
            );
            write_json(&args.output_dir.join("evaluation.json"), &report)?;
        }
        // Partial coverage, not a failure: nothing to score after warm-up.
        Err(ProcessorError::EmptyHistory) => {
            warn!("no rateable games after the warm-up window, skipping evaluation")
        }
        Err(e) => return Err(e)
    }

    Ok(())
}

fn run_ewma(args: &Args, config: &Config, participations: &[Participation]) -> Result<()> {
    let ratings = compute_ewma_ratings(participations, config.ewma_alpha)?;
    info!(rows = ratings.len(), alpha = config.ewma_alpha, "ewma ratings produced");
    write_json(&args.output_dir.join("ewma_ratings.json"), &ratings)?;

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;

    Ok(())
}
