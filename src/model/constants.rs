// Model constants
pub const DEFAULT_MU: f64 = 25.0;
pub const DEFAULT_SIGMA: f64 = DEFAULT_MU / 3.0;
pub const BETA: f64 = DEFAULT_SIGMA / 2.0;
pub const KAPPA: f64 = 0.0001;
// Deviations are floored after every update so that precision-weighted
// fusion never divides by zero.
pub const SIGMA_FLOOR: f64 = 0.0001;
pub const DEFAULT_LOWER_BOUND_K: f64 = 3.0;
pub const DEFAULT_WIN_PROBABILITY_SCALE: f64 = 1.0;
pub const DEFAULT_EWMA_ALPHA: f64 = 0.05;
pub const DEFAULT_CALIBRATION_BINS: usize = 10;
// Snapshot fallback when a region has no whitelisted series yet.
pub const FALLBACK_WINDOW_DAYS: i64 = 183;
// Bucket for players whose region never appears in the dataset.
pub const OTHER_REGION: &str = "Other";
