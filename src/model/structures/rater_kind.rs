use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::EnumIter;

use crate::error::ProcessorError;

/// The two interchangeable rating backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum RaterKind {
    /// Pairwise factor-graph update (TrueSkill).
    Pairwise,
    /// Multi-competitor weighted-rank update (Plackett-Luce).
    RankBased
}

impl RaterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaterKind::Pairwise => "pairwise",
            RaterKind::RankBased => "rank-based"
        }
    }
}

impl fmt::Display for RaterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RaterKind {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pairwise" => Ok(RaterKind::Pairwise),
            "rank-based" => Ok(RaterKind::RankBased),
            other => Err(ProcessorError::UnknownRaterModel(other.to_string()))
        }
    }
}

impl Serialize for RaterKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RaterKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}
