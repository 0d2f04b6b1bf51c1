//! Mergeable per-bin accumulators.
//!
//! All fields combine by addition (min/max by min/max), so merging is
//! associative and commutative. Results of differently partitioned runs agree
//! up to floating-point summation order; compare them with a relative
//! tolerance rather than exact equality.

use binning_common::{BinningError, BinningResult};

use crate::config::NonFinitePolicy;
use crate::record::ChannelStatistics;

/// Running sums of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelAccumulator {
    pub count: u64,
    pub sum: f64,
    pub sum_sq: f64,
    pub min: f64,
    pub max: f64,
    /// Sum over scenes of `sqrt(n)`.
    pub weight: f64,
    /// Sum over scenes of `sum / sqrt(n)`.
    pub weighted_sum: f64,
    /// Sum over scenes of `sum_sq / sqrt(n)`.
    pub weighted_sum_sq: f64,
}

impl Default for ChannelAccumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            weight: 0.0,
            weighted_sum: 0.0,
            weighted_sum_sq: 0.0,
        }
    }
}

impl ChannelAccumulator {
    /// Add one sample as its own single-observation scene.
    #[inline]
    fn add(&mut self, v: f64) {
        self.add_spatial(v);
        self.weight += 1.0;
        self.weighted_sum += v;
        self.weighted_sum_sq += v * v;
    }

    /// Add one sample to the plain sums only (within-scene accumulation).
    #[inline]
    fn add_spatial(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.sum_sq += v * v;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    /// Fold the spatial sums of one scene, weighting it by `sqrt(n)`.
    fn add_scene(&mut self, scene: &ChannelAccumulator) {
        if scene.count == 0 {
            return;
        }
        let root_n = (scene.count as f64).sqrt();
        self.count += scene.count;
        self.sum += scene.sum;
        self.sum_sq += scene.sum_sq;
        self.min = self.min.min(scene.min);
        self.max = self.max.max(scene.max);
        self.weight += root_n;
        self.weighted_sum += scene.sum / root_n;
        self.weighted_sum_sq += scene.sum_sq / root_n;
    }

    fn merge(&mut self, other: &ChannelAccumulator) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.weight += other.weight;
        self.weighted_sum += other.weighted_sum;
        self.weighted_sum_sq += other.weighted_sum_sq;
    }

    /// Mean, variance, extrema and weighted mean of the channel.
    pub fn finalize(&self) -> ChannelStatistics {
        if self.count == 0 {
            return ChannelStatistics::empty();
        }
        let n = self.count as f64;
        let mean = self.sum / n;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        let weighted_mean = if self.weight > 0.0 {
            self.weighted_sum / self.weight
        } else {
            f64::NAN
        };

        ChannelStatistics {
            count: self.count,
            mean,
            variance,
            min: self.min,
            max: self.max,
            weighted_mean,
            weight: self.weight,
        }
    }
}

/// Check an observation's values against the channel count and the
/// non-finite policy without touching any accumulator.
pub fn check_values(values: &[f64], num_channels: usize, policy: NonFinitePolicy) -> BinningResult<()> {
    if values.len() != num_channels {
        return Err(BinningError::invalid_observation(format!(
            "expected {} values, got {}",
            num_channels,
            values.len()
        )));
    }
    if policy == NonFinitePolicy::Reject {
        if let Some((channel, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(BinningError::invalid_observation(format!(
                "non-finite value {} in channel {}",
                v, channel
            )));
        }
    }
    Ok(())
}

/// Statistical state of one bin.
///
/// Not synchronized; the engine gives each worker its own accumulators.
#[derive(Debug, Clone, PartialEq)]
pub struct BinAccumulator {
    pub num_obs: u64,
    pub num_scenes: u64,
    pub channels: Vec<ChannelAccumulator>,
}

/// Finalized contents of a bin, before its position is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedBin {
    pub num_obs: u64,
    pub num_scenes: u64,
    pub channels: Vec<ChannelStatistics>,
}

impl BinAccumulator {
    pub fn new(num_channels: usize) -> Self {
        Self {
            num_obs: 0,
            num_scenes: 0,
            channels: vec![ChannelAccumulator::default(); num_channels],
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_obs == 0
    }

    /// Add one observation. Without scene grouping every observation counts
    /// as its own scene.
    ///
    /// On error the accumulator is unchanged.
    pub fn update(&mut self, values: &[f64], policy: NonFinitePolicy) -> BinningResult<()> {
        check_values(values, self.channels.len(), policy)?;
        for (channel, &v) in self.channels.iter_mut().zip(values) {
            if v.is_finite() {
                channel.add(v);
            }
        }
        self.num_obs += 1;
        self.num_scenes += 1;
        Ok(())
    }

    /// Add one observation to the plain sums only; used while collecting a
    /// scene before it is folded with [`BinAccumulator::fold_scene`].
    pub fn update_spatial(&mut self, values: &[f64], policy: NonFinitePolicy) -> BinningResult<()> {
        check_values(values, self.channels.len(), policy)?;
        for (channel, &v) in self.channels.iter_mut().zip(values) {
            if v.is_finite() {
                channel.add_spatial(v);
            }
        }
        self.num_obs += 1;
        Ok(())
    }

    /// Fold a scene's spatial accumulator into this temporal one.
    pub fn fold_scene(&mut self, scene: &BinAccumulator) {
        if scene.is_empty() {
            return;
        }
        debug_assert_eq!(self.channels.len(), scene.channels.len());
        for (channel, scene_channel) in self.channels.iter_mut().zip(&scene.channels) {
            channel.add_scene(scene_channel);
        }
        self.num_obs += scene.num_obs;
        self.num_scenes += 1;
    }

    /// Field-wise merge of another accumulator of the same channel count.
    pub fn merge(&mut self, other: &BinAccumulator) {
        debug_assert_eq!(self.channels.len(), other.channels.len());
        for (channel, other_channel) in self.channels.iter_mut().zip(&other.channels) {
            channel.merge(other_channel);
        }
        self.num_obs += other.num_obs;
        self.num_scenes += other.num_scenes;
    }

    /// Final statistics, or `None` for an untouched bin or one with fewer
    /// than `min_observations` observations.
    pub fn finalize(&self, min_observations: u64) -> Option<FinalizedBin> {
        if self.num_obs == 0 || self.num_obs < min_observations {
            return None;
        }
        Some(FinalizedBin {
            num_obs: self.num_obs,
            num_scenes: self.num_scenes,
            channels: self.channels.iter().map(ChannelAccumulator::finalize).collect(),
        })
    }
}
