use thiserror::Error;

/// Result type alias used throughout the processor.
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// Fatal error conditions. Recoverable conditions (games with too few
/// competitors, unseen regions, snapshot cold starts) are logged and
/// skipped instead of surfacing here.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("input is not sorted by (date, win desc): violation at row {position}")]
    UnsortedInput { position: usize },

    #[error("supplied prior deviation must be strictly positive, got {sigma}")]
    InvalidPrior { sigma: f64 },

    #[error("unsupported rater model `{0}`")]
    UnknownRaterModel(String),

    #[error("unsupported rating method `{0}`")]
    UnknownMethod(String),

    #[error("ewma smoothing factor must be in (0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("rater invoked with {teams} competitors and {ranks} ranks")]
    CompetitorRankMismatch { teams: usize, ranks: usize },

    #[error("rating history is empty")]
    EmptyHistory,

    #[error("evaluation warm-up window ends before it starts")]
    InvalidWarmupWindow,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
