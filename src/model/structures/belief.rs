use serde::{Deserialize, Serialize};

use crate::model::constants::SIGMA_FLOOR;

/// Gaussian skill estimate. `sigma` is strictly positive in every belief
/// the processor produces; evidence only shrinks it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Belief {
    pub mu: f64,
    pub sigma: f64
}

impl Belief {
    pub fn new(mu: f64, sigma: f64) -> Belief {
        Belief { mu, sigma }
    }

    pub fn precision(&self) -> f64 {
        1.0 / (self.sigma * self.sigma)
    }

    /// A prior must be finite with a strictly positive deviation.
    pub fn is_valid_prior(&self) -> bool {
        self.mu.is_finite() && self.sigma.is_finite() && self.sigma > 0.0
    }

    /// Clamps the deviation to the processing floor.
    pub fn floored(self) -> Belief {
        Belief {
            mu: self.mu,
            sigma: self.sigma.max(SIGMA_FLOOR)
        }
    }

    /// Conservative scalar estimate, `mu - k * sigma`.
    pub fn lower_bound(&self, k: f64) -> f64 {
        self.mu - k * self.sigma
    }
}
