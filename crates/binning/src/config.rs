//! Configuration for the binning engine.

use binning_common::{BinningError, BinningResult, BoundingBox, GridKind, GridSpec};
use serde::{Deserialize, Serialize};

/// Configuration for a binning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    /// Target grid.
    pub grid: GridSpec,

    /// Names of the measured channels, in observation value order.
    pub variables: Vec<String>,

    /// What to do with NaN/Inf channel values.
    pub non_finite: NonFinitePolicy,

    /// Upper bound on the number of accumulators one engine may hold.
    pub max_bins: Option<usize>,

    /// Bins with fewer observations are dropped at finalization.
    pub min_observations: u64,

    /// Only observations inside this region are binned.
    pub region: Option<BoundingBox>,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            variables: vec!["value".to_string()],
            non_finite: NonFinitePolicy::Reject,
            max_bins: None,
            min_observations: 1,
            region: None,
        }
    }
}

impl BinningConfig {
    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `BINNING_*` environment variables over this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BINNING_GRID_KIND") {
            if let Some(kind) = GridKind::parse(&val) {
                self.grid.kind = kind;
            }
        }

        if let Ok(val) = std::env::var("BINNING_NUM_ROWS") {
            if let Ok(rows) = val.parse() {
                self.grid.num_rows = rows;
            }
        }

        if let Ok(val) = std::env::var("BINNING_VARIABLES") {
            let variables: Vec<String> = val
                .split(',')
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if !variables.is_empty() {
                self.variables = variables;
            }
        }

        if let Ok(val) = std::env::var("BINNING_NON_FINITE") {
            self.non_finite = NonFinitePolicy::from_str(&val);
        }

        if let Ok(val) = std::env::var("BINNING_MAX_BINS") {
            if let Ok(max) = val.parse() {
                self.max_bins = Some(max);
            }
        }

        if let Ok(val) = std::env::var("BINNING_MIN_OBSERVATIONS") {
            if let Ok(min) = val.parse() {
                self.min_observations = min;
            }
        }

        if let Ok(val) = std::env::var("BINNING_REGION") {
            if let Ok(region) = BoundingBox::parse(&val) {
                self.region = Some(region);
            }
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BinningResult<()> {
        if self.grid.num_rows == 0 {
            return Err(BinningError::Config("grid.num_rows must be > 0".to_string()));
        }

        if self.variables.is_empty() {
            return Err(BinningError::Config(
                "at least one variable must be configured".to_string(),
            ));
        }

        for (i, variable) in self.variables.iter().enumerate() {
            if self.variables[..i].contains(variable) {
                return Err(BinningError::Config(format!(
                    "duplicate variable '{}'",
                    variable
                )));
            }
        }

        if self.max_bins == Some(0) {
            return Err(BinningError::Config("max_bins must be > 0".to_string()));
        }

        if let Some(region) = &self.region {
            if region.min_lat > region.max_lat {
                return Err(BinningError::Config(format!(
                    "region min_lat {} above max_lat {}",
                    region.min_lat, region.max_lat
                )));
            }
        }

        Ok(())
    }

    /// Number of channels each observation must carry.
    pub fn num_channels(&self) -> usize {
        self.variables.len()
    }

    /// Position of a variable in the channel list.
    pub fn channel_of(&self, variable: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }
}

/// Handling of non-finite channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NonFinitePolicy {
    /// Reject the whole observation as invalid.
    #[default]
    Reject,
    /// Drop only the offending channel value; the other channels still count.
    SkipValue,
}

impl NonFinitePolicy {
    /// Parse from string (case-insensitive), defaulting to `Reject`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "skip" | "skip_value" => Self::SkipValue,
            _ => Self::Reject,
        }
    }
}
