use std::{collections::HashMap, fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use chrono::{DateTime, FixedOffset};
use lazy_static::lazy_static;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    error::{ProcessorError, Result},
    model::{
        constants::{
            DEFAULT_CALIBRATION_BINS, DEFAULT_EWMA_ALPHA, DEFAULT_LOWER_BOUND_K, DEFAULT_MU, DEFAULT_SIGMA,
            DEFAULT_WIN_PROBABILITY_SCALE
        },
        structures::{belief::Belief, rater_kind::RaterKind}
    }
};

lazy_static! {
    /// Compiled-in whitelist of each main region's primary recurring
    /// domestic competitions, in calendar order. Datasets with their own
    /// naming override this through the configuration file.
    pub static ref DEFAULT_REGION_WHITELIST: HashMap<String, Vec<String>> = {
        let mut whitelist = HashMap::new();
        whitelist.insert("Korea".to_string(), vec!["LCK Spring".to_string(), "LCK Summer".to_string()]);
        whitelist.insert("China".to_string(), vec!["LPL Spring".to_string(), "LPL Summer".to_string()]);
        whitelist.insert(
            "Europe".to_string(),
            vec!["LEC Winter".to_string(), "LEC Spring".to_string(), "LEC Summer".to_string()]
        );
        whitelist.insert(
            "North America".to_string(),
            vec!["LCS Spring".to_string(), "LCS Summer".to_string()]
        );
        whitelist.insert(
            "Asia-Pacific".to_string(),
            vec!["PCS Spring".to_string(), "PCS Summer".to_string()]
        );
        whitelist.insert("Vietnam".to_string(), vec!["VCS Spring".to_string(), "VCS Summer".to_string()]);
        whitelist.insert(
            "Brazil".to_string(),
            vec!["CBLOL Split 1".to_string(), "CBLOL Split 2".to_string()]
        );
        whitelist.insert(
            "Latin America".to_string(),
            vec!["LLA Opening".to_string(), "LLA Closing".to_string()]
        );
        whitelist
    };
}

/// Top-level rating method. `bayesian` is the full belief-update engine;
/// `ewma` is the smoothed-score baseline kept for evaluation experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Bayesian,
    Ewma
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Bayesian => "bayesian",
            Method::Ewma => "ewma"
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bayesian" => Ok(Method::Bayesian),
            "ewma" => Ok(Method::Ewma),
            other => Err(ProcessorError::UnknownMethod(other.to_string()))
        }
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub method: Method,
    pub ewma_alpha: f64,
    pub rating: RatingConfig,
    pub ranking: RankingConfig,
    pub evaluation: EvaluationConfig
}

impl Default for Config {
    fn default() -> Self {
        Config {
            method: Method::Bayesian,
            ewma_alpha: DEFAULT_EWMA_ALPHA,
            rating: RatingConfig::default(),
            ranking: RankingConfig::default(),
            evaluation: EvaluationConfig::default()
        }
    }
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Config> {
        let file = File::open(path)?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.rating.validate()?;
        self.evaluation.validate()?;

        if !(self.ewma_alpha > 0.0 && self.ewma_alpha <= 1.0) {
            return Err(ProcessorError::InvalidAlpha(self.ewma_alpha));
        }

        Ok(())
    }
}

/// Options of the belief-update engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub rater_model: RaterKind,
    /// Free-for-all mode ranks every participant by performance score;
    /// team mode rates two aggregate sides by win/loss.
    pub use_ffa_setting: bool,
    /// Region fusion toggle. Off, overall ratings equal contextual
    /// ratings; player-level updates are unaffected either way.
    pub use_meta_ratings: bool,
    pub prior_mu: f64,
    pub prior_sigma: f64,
    pub lower_bound_k: f64,
    pub region_whitelist: HashMap<String, Vec<String>>
}

impl Default for RatingConfig {
    fn default() -> Self {
        RatingConfig {
            rater_model: RaterKind::RankBased,
            use_ffa_setting: true,
            use_meta_ratings: true,
            prior_mu: DEFAULT_MU,
            prior_sigma: DEFAULT_SIGMA,
            lower_bound_k: DEFAULT_LOWER_BOUND_K,
            region_whitelist: DEFAULT_REGION_WHITELIST.clone()
        }
    }
}

impl RatingConfig {
    pub fn prior(&self) -> Belief {
        Belief::new(self.prior_mu, self.prior_sigma)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.prior().is_valid_prior() {
            return Err(ProcessorError::InvalidPrior { sigma: self.prior_sigma });
        }

        Ok(())
    }
}

/// Leaderboard construction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Only players whose latest game is at or after this date are ranked.
    pub since: DateTime<FixedOffset>,
    pub min_games: usize
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            since: "2024-03-15T00:00:00+00:00".parse().unwrap(),
            min_games: 10
        }
    }
}

/// Win-probability evaluation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub start_warmup_date: DateTime<FixedOffset>,
    pub end_warmup_date: DateTime<FixedOffset>,
    /// Scale of the logistic link turning rating difference into a win
    /// probability.
    pub win_probability_scale: f64,
    pub calibration_bins: usize
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            start_warmup_date: "2019-09-15T00:00:00+00:00".parse().unwrap(),
            end_warmup_date: "2020-09-15T00:00:00+00:00".parse().unwrap(),
            win_probability_scale: DEFAULT_WIN_PROBABILITY_SCALE,
            calibration_bins: DEFAULT_CALIBRATION_BINS
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.end_warmup_date < self.start_warmup_date {
            return Err(ProcessorError::InvalidWarmupWindow);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_method_carries_name() {
        let err = "elo".parse::<Method>().unwrap_err();
        assert!(err.to_string().contains("elo"));
    }

    #[test]
    fn test_non_positive_prior_sigma_is_fatal() {
        let config = Config {
            rating: RatingConfig {
                prior_sigma: 0.0,
                ..RatingConfig::default()
            },
            ..Config::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ProcessorError::InvalidPrior { sigma }) if sigma == 0.0
        ));
    }

    #[test]
    fn test_alpha_outside_unit_interval_is_fatal() {
        for alpha in [0.0, -0.5, 1.5] {
            let config = Config {
                ewma_alpha: alpha,
                ..Config::default()
            };
            assert!(matches!(config.validate(), Err(ProcessorError::InvalidAlpha(_))));
        }
    }

    #[test]
    fn test_config_deserializes_with_partial_keys() {
        let json = r#"{
            "method": "bayesian",
            "rating": { "rater_model": "pairwise", "use_meta_ratings": false }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.rating.rater_model, RaterKind::Pairwise);
        assert!(!config.rating.use_meta_ratings);
        // Untouched keys keep their defaults.
        assert!(config.rating.use_ffa_setting);
        assert_eq!(config.ranking.min_games, 10);
    }

    #[test]
    fn test_unknown_rater_model_in_json_fails() {
        let json = r#"{ "rating": { "rater_model": "glicko2" } }"#;
        let parsed = serde_json::from_str::<Config>(json);

        assert!(parsed.is_err());
        assert!(parsed.unwrap_err().to_string().contains("glicko2"));
    }

    #[test]
    fn test_default_whitelist_covers_main_regions() {
        for region in ["Korea", "China", "Europe", "North America"] {
            assert!(DEFAULT_REGION_WHITELIST.contains_key(region));
        }
        assert!(!DEFAULT_REGION_WHITELIST.contains_key("Other"));
    }
}
