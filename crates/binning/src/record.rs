//! Finalized per-bin statistics.

use binning_common::BinIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Finalized statistics of one channel in one bin.
///
/// Channels that never received a finite value carry `count == 0` and NaN
/// statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStatistics {
    pub count: u64,
    pub mean: f64,
    /// Population variance, `sum_sq / count - mean²`, clamped at zero.
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    /// Mean weighted by `sqrt(n)` per scene.
    pub weighted_mean: f64,
    pub weight: f64,
}

impl ChannelStatistics {
    /// Statistics of a channel without any valid sample.
    pub fn empty() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            variance: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            weighted_mean: f64::NAN,
            weight: 0.0,
        }
    }

    /// Standard deviation.
    pub fn sigma(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Select one statistic.
    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Mean => self.mean,
            Statistic::Variance => self.variance,
            Statistic::Sigma => self.sigma(),
            Statistic::Min => self.min,
            Statistic::Max => self.max,
            Statistic::WeightedMean => self.weighted_mean,
            Statistic::Count => self.count as f64,
        }
    }
}

/// A finalized, immutable bin ready for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinRecord {
    pub bin_index: BinIndex,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Observations that landed in the bin.
    pub num_obs: u64,
    /// Scenes (swaths) that contributed to the bin.
    pub num_scenes: u64,
    pub channels: Vec<ChannelStatistics>,
}

impl BinRecord {
    /// Value of `statistic` for channel `channel`, if the channel exists.
    pub fn value(&self, channel: usize, statistic: Statistic) -> Option<f64> {
        self.channels.get(channel).map(|c| c.get(statistic))
    }
}

/// Statistic selectable from a finalized channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    #[default]
    Mean,
    Variance,
    Sigma,
    Min,
    Max,
    WeightedMean,
    Count,
}

impl Statistic {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mean" => Some(Self::Mean),
            "variance" | "var" => Some(Self::Variance),
            "sigma" | "stddev" => Some(Self::Sigma),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "weighted_mean" => Some(Self::WeightedMean),
            "count" => Some(Self::Count),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Variance => "variance",
            Self::Sigma => "sigma",
            Self::Min => "min",
            Self::Max => "max",
            Self::WeightedMean => "weighted_mean",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
