use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone)]
#[command(
    display_name = "ESR Processor",
    author = "Esports Skill Rating",
    long_about = "Replays a chronological stream of game results and generates \
    player skill ratings, regional meta ratings, rankings and an evaluation report"
)]
pub struct Args {
    /// The participation table exported by the upstream data pipeline:
    /// a JSON array of per-game player records carrying performance
    /// scores, already sorted by (date, win desc).
    #[arg(short, long, env, help = "Path to the sorted participation table (JSON)")]
    pub input: PathBuf,

    #[arg(
        short,
        long,
        env,
        default_value = "artifacts",
        help = "Directory the output tables are written to"
    )]
    pub output_dir: PathBuf,

    /// Unrecognized rater models, methods or priors in the file fail
    /// immediately with the offending value.
    #[arg(short, long, env, help = "Optional JSON configuration file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String
}
