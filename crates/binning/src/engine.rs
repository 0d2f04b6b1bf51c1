//! Single-worker binning engine.
//!
//! An engine owns an index-keyed table of accumulators. Workers each run
//! their own engine over a disjoint partition; engines are then combined with
//! [`BinningEngine::merge`].

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use binning_common::{BinIndex, BinningError, BinningResult, GridSpec, Observation};
use planetary_grid::BinIndexResolver;
use tracing::{debug, info};

use crate::accumulator::{check_values, BinAccumulator};
use crate::config::BinningConfig;
use crate::parallel::CancelToken;
use crate::record::BinRecord;

/// Result of binning a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOutcome {
    /// Accumulated into the given bin.
    Binned(BinIndex),
    /// Valid position outside the configured region; nothing accumulated.
    OutsideRegion,
}

/// Counters for one batch (or a merged set of batches).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub accepted: u64,
    pub rejected: u64,
    pub outside_region: u64,
    pub cancelled: bool,
}

impl BatchReport {
    /// Observations looked at, whatever their fate.
    pub fn processed(&self) -> u64 {
        self.accepted + self.rejected + self.outside_region
    }

    pub fn merge(&mut self, other: &BatchReport) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.outside_region += other.outside_region;
        self.cancelled |= other.cancelled;
    }
}

/// Accumulates observations into bins of one grid.
#[derive(Debug)]
pub struct BinningEngine {
    resolver: Arc<BinIndexResolver>,
    config: Arc<BinningConfig>,
    bins: HashMap<BinIndex, BinAccumulator>,
    observations: u64,
    rejected: u64,
}

impl BinningEngine {
    /// Create an engine over an existing resolver.
    ///
    /// The resolver must be built for `config.grid`.
    pub fn new(resolver: Arc<BinIndexResolver>, config: Arc<BinningConfig>) -> BinningResult<Self> {
        config.validate()?;
        if resolver.spec() != config.grid {
            return Err(BinningError::GridMismatch(format!(
                "resolver is built for {}, configuration asks for {}",
                resolver.spec(),
                config.grid
            )));
        }

        Ok(Self {
            resolver,
            config,
            bins: HashMap::new(),
            observations: 0,
            rejected: 0,
        })
    }

    /// Build the grid named by `config` and an engine over it.
    pub fn from_config(config: BinningConfig) -> BinningResult<Self> {
        let resolver = BinIndexResolver::for_spec(config.grid)?;
        Self::new(Arc::new(resolver), Arc::new(config))
    }

    /// A fresh engine sharing this engine's grid and configuration.
    pub fn empty_like(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            config: Arc::clone(&self.config),
            bins: HashMap::new(),
            observations: 0,
            rejected: 0,
        }
    }

    pub fn resolver(&self) -> &Arc<BinIndexResolver> {
        &self.resolver
    }

    pub fn config(&self) -> &Arc<BinningConfig> {
        &self.config
    }

    pub fn grid_spec(&self) -> GridSpec {
        self.config.grid
    }

    /// Number of bins holding an accumulator.
    pub fn num_bins_touched(&self) -> usize {
        self.bins.len()
    }

    /// Observations accumulated so far.
    pub fn observations(&self) -> u64 {
        self.observations
    }

    /// Observations skipped as invalid by batch operations.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Accumulator of a bin, if touched.
    pub fn accumulator(&self, bin_index: BinIndex) -> Option<&BinAccumulator> {
        self.bins.get(&bin_index)
    }

    /// Resolve an observation to its bin, or `None` when outside the region.
    ///
    /// Validates both position and values so that callers can reject the
    /// observation before any accumulator is touched.
    fn locate(&self, obs: &Observation) -> BinningResult<Option<BinIndex>> {
        let bin_index = self.resolver.bin_index(obs.lat, obs.lon)?;
        check_values(&obs.values, self.config.num_channels(), self.config.non_finite)?;

        if let Some(region) = &self.config.region {
            if !region.contains(obs.lat, obs.lon) {
                return Ok(None);
            }
        }
        Ok(Some(bin_index))
    }

    /// Fail if creating `extra` more accumulators would exceed `max_bins`.
    fn ensure_capacity(&self, bin_index: BinIndex, extra: usize, scene_offset: u64) -> BinningResult<()> {
        if let Some(max_bins) = self.config.max_bins {
            if self.bins.len() + extra >= max_bins {
                return Err(BinningError::ResourceExhausted {
                    bin_index,
                    max_bins,
                    observations: self.observations,
                    scene_offset,
                });
            }
        }
        Ok(())
    }

    /// Bin one observation.
    ///
    /// On error the engine is unchanged. `ResourceExhausted` means the
    /// observation needs a new accumulator and the table is full; the caller
    /// may [`flush`](Self::flush) and retry.
    pub fn bin(&mut self, obs: &Observation) -> BinningResult<BinOutcome> {
        let Some(bin_index) = self.locate(obs)? else {
            return Ok(BinOutcome::OutsideRegion);
        };

        if !self.bins.contains_key(&bin_index) {
            self.ensure_capacity(bin_index, 0, 0)?;
        }

        let num_channels = self.config.num_channels();
        self.bins
            .entry(bin_index)
            .or_insert_with(|| BinAccumulator::new(num_channels))
            .update(&obs.values, self.config.non_finite)?;
        self.observations += 1;

        Ok(BinOutcome::Binned(bin_index))
    }

    /// Bin a sequence of independent observations.
    ///
    /// Invalid observations are counted and skipped. The cancel token is
    /// checked before every observation; a cancelled batch keeps what it
    /// accumulated and reports `cancelled`. `ResourceExhausted` aborts the
    /// batch, keeping the observations binned before it.
    pub fn bin_batch<I>(&mut self, observations: I, cancel: &CancelToken) -> BinningResult<BatchReport>
    where
        I: IntoIterator,
        I::Item: Borrow<Observation>,
    {
        let mut report = BatchReport::default();

        for obs in observations {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match self.bin(obs.borrow()) {
                Ok(BinOutcome::Binned(_)) => report.accepted += 1,
                Ok(BinOutcome::OutsideRegion) => report.outside_region += 1,
                Err(BinningError::InvalidObservation { reason }) => {
                    debug!(reason = %reason, "Skipping invalid observation");
                    report.rejected += 1;
                    self.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            accepted = report.accepted,
            rejected = report.rejected,
            outside_region = report.outside_region,
            cancelled = report.cancelled,
            bins = self.bins.len(),
            "Binned batch"
        );

        Ok(report)
    }

    /// Bin the observations of one scene.
    ///
    /// Observations are first summed per bin within the scene, then each
    /// scene bin is folded into the engine with `sqrt(n)` weighting. If the
    /// accumulator table fills up mid-scene the whole scene is discarded and
    /// the engine is left as it was.
    pub fn bin_scene<I>(&mut self, observations: I, cancel: &CancelToken) -> BinningResult<BatchReport>
    where
        I: IntoIterator,
        I::Item: Borrow<Observation>,
    {
        let num_channels = self.config.num_channels();
        let policy = self.config.non_finite;
        let mut scene: HashMap<BinIndex, BinAccumulator> = HashMap::new();
        let mut new_bins = 0usize;
        let mut report = BatchReport::default();
        let mut rejected = 0u64;

        for (position, obs) in observations.into_iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let obs = obs.borrow();

            let bin_index = match self.locate(obs) {
                Ok(Some(bin_index)) => bin_index,
                Ok(None) => {
                    report.outside_region += 1;
                    continue;
                }
                Err(BinningError::InvalidObservation { reason }) => {
                    debug!(reason = %reason, "Skipping invalid observation");
                    rejected += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let acc = match scene.entry(bin_index) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    if !self.bins.contains_key(&bin_index) {
                        self.ensure_capacity(bin_index, new_bins, position as u64)?;
                        new_bins += 1;
                    }
                    entry.insert(BinAccumulator::new(num_channels))
                }
            };
            acc.update_spatial(&obs.values, policy)?;
            report.accepted += 1;
        }

        for (bin_index, scene_acc) in scene {
            self.bins
                .entry(bin_index)
                .or_insert_with(|| BinAccumulator::new(num_channels))
                .fold_scene(&scene_acc);
        }
        self.observations += report.accepted;
        self.rejected += rejected;
        report.rejected = rejected;

        debug!(
            accepted = report.accepted,
            rejected = report.rejected,
            outside_region = report.outside_region,
            cancelled = report.cancelled,
            bins = self.bins.len(),
            "Binned scene"
        );

        Ok(report)
    }

    /// Absorb another engine's accumulators.
    ///
    /// Both engines must share grid and channel count. `max_bins` is not
    /// enforced on the merged table.
    pub fn merge(&mut self, mut other: BinningEngine) -> BinningResult<()> {
        if self.grid_spec() != other.grid_spec() {
            return Err(BinningError::GridMismatch(format!(
                "cannot merge {} into {}",
                other.grid_spec(),
                self.grid_spec()
            )));
        }
        if self.config.num_channels() != other.config.num_channels() {
            return Err(BinningError::GridMismatch(format!(
                "cannot merge {} channels into {}",
                other.config.num_channels(),
                self.config.num_channels()
            )));
        }

        // Iterate over the smaller table
        if other.bins.len() > self.bins.len() {
            std::mem::swap(&mut self.bins, &mut other.bins);
        }

        for (bin_index, acc) in other.bins {
            match self.bins.entry(bin_index) {
                Entry::Occupied(mut entry) => entry.get_mut().merge(&acc),
                Entry::Vacant(entry) => {
                    entry.insert(acc);
                }
            }
        }
        self.observations += other.observations;
        self.rejected += other.rejected;

        Ok(())
    }

    /// Finalize every bin, consuming the engine.
    ///
    /// Records are strictly ascending by bin index. Bins below
    /// `min_observations` are omitted.
    pub fn finalize_all(self) -> BinningResult<Vec<BinRecord>> {
        let records = finalize_bins(&self.resolver, self.config.min_observations, self.bins)?;
        info!(
            records = records.len(),
            observations = self.observations,
            rejected = self.rejected,
            grid = %self.config.grid,
            "Finalized bins"
        );
        Ok(records)
    }

    /// Finalize and clear the table in place, keeping grid and counters.
    pub fn flush(&mut self) -> BinningResult<Vec<BinRecord>> {
        let bins = std::mem::take(&mut self.bins);
        let records = finalize_bins(&self.resolver, self.config.min_observations, bins)?;
        debug!(records = records.len(), "Flushed accumulator table");
        Ok(records)
    }
}

fn finalize_bins(
    resolver: &BinIndexResolver,
    min_observations: u64,
    bins: HashMap<BinIndex, BinAccumulator>,
) -> BinningResult<Vec<BinRecord>> {
    let mut records = Vec::with_capacity(bins.len());

    for (bin_index, acc) in bins {
        let Some(bin) = acc.finalize(min_observations) else {
            continue;
        };
        let (center_lat, center_lon) = resolver.center_lat_lon(bin_index)?;
        records.push(BinRecord {
            bin_index,
            center_lat,
            center_lon,
            num_obs: bin.num_obs,
            num_scenes: bin.num_scenes,
            channels: bin.channels,
        });
    }

    records.sort_unstable_by_key(|r| r.bin_index);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NonFinitePolicy;
    use binning_common::BoundingBox;

    fn gaussian_config() -> BinningConfig {
        BinningConfig {
            grid: GridSpec::reduced_gaussian(64),
            ..BinningConfig::default()
        }
    }

    fn obs(lat: f64, lon: f64, v: f64) -> Observation {
        Observation::new(lat, lon, vec![v])
    }

    #[test]
    fn test_bin_single_observation() {
        let mut engine = BinningEngine::from_config(gaussian_config()).unwrap();
        let outcome = engine.bin(&obs(45.0, 90.0, 1.0)).unwrap();
        assert_eq!(outcome, BinOutcome::Binned(1026));
        assert_eq!(engine.num_bins_touched(), 1);
        assert_eq!(engine.observations(), 1);
    }

    #[test]
    fn test_invalid_observation_leaves_engine_unchanged() {
        let mut engine = BinningEngine::from_config(gaussian_config()).unwrap();
        assert!(engine.bin(&obs(95.0, 0.0, 1.0)).is_err());
        assert!(engine.bin(&obs(f64::NAN, 0.0, 1.0)).is_err());
        assert!(engine.bin(&obs(0.0, 0.0, f64::NAN)).is_err());
        assert!(engine.bin(&Observation::new(0.0, 0.0, vec![1.0, 2.0])).is_err());
        assert!(engine.is_empty());
        assert_eq!(engine.observations(), 0);
    }

    #[test]
    fn test_resource_exhausted() {
        let config = BinningConfig {
            max_bins: Some(2),
            ..gaussian_config()
        };
        let mut engine = BinningEngine::from_config(config).unwrap();
        engine.bin(&obs(45.0, 90.0, 1.0)).unwrap();
        engine.bin(&obs(-45.0, 90.0, 1.0)).unwrap();
        // Existing bins still accept observations
        engine.bin(&obs(45.0, 90.0, 2.0)).unwrap();

        let err = engine.bin(&obs(0.0, 0.0, 1.0)).unwrap_err();
        match err {
            BinningError::ResourceExhausted {
                max_bins,
                observations,
                scene_offset,
                ..
            } => {
                assert_eq!(max_bins, 2);
                assert_eq!(observations, 3);
                assert_eq!(scene_offset, 0);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(engine.num_bins_touched(), 2);

        let flushed = engine.flush().unwrap();
        assert_eq!(flushed.len(), 2);
        engine.bin(&obs(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(engine.num_bins_touched(), 1);
    }

    #[test]
    fn test_batch_counts_rejections() {
        let mut engine = BinningEngine::from_config(gaussian_config()).unwrap();
        let batch = vec![
            obs(10.0, 10.0, 1.0),
            obs(100.0, 10.0, 1.0),
            obs(10.0, 10.0, f64::INFINITY),
            obs(-10.0, 370.0, 3.0),
        ];
        let report = engine.bin_batch(&batch, &CancelToken::new()).unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 2);
        assert!(!report.cancelled);
        assert_eq!(engine.rejected(), 2);
    }

    #[test]
    fn test_skip_value_policy() {
        let config = BinningConfig {
            non_finite: NonFinitePolicy::SkipValue,
            variables: vec!["a".into(), "b".into()],
            ..gaussian_config()
        };
        let mut engine = BinningEngine::from_config(config).unwrap();
        engine.bin(&Observation::new(0.0, 0.0, vec![f64::NAN, 2.0])).unwrap();
        engine.bin(&Observation::new(0.0, 0.0, vec![4.0, 6.0])).unwrap();

        let records = engine.finalize_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].num_obs, 2);
        assert_eq!(records[0].channels[0].count, 1);
        assert_eq!(records[0].channels[0].mean, 4.0);
        assert_eq!(records[0].channels[1].mean, 4.0);
    }

    #[test]
    fn test_region_filter() {
        let config = BinningConfig {
            region: Some(BoundingBox::new(0.0, 0.0, 20.0, 20.0)),
            ..gaussian_config()
        };
        let mut engine = BinningEngine::from_config(config).unwrap();
        assert!(matches!(engine.bin(&obs(10.0, 10.0, 1.0)).unwrap(), BinOutcome::Binned(_)));
        assert_eq!(engine.bin(&obs(-10.0, 10.0, 1.0)).unwrap(), BinOutcome::OutsideRegion);

        let report = engine
            .bin_batch(vec![obs(30.0, 5.0, 1.0), obs(5.0, 5.0, 1.0)], &CancelToken::new())
            .unwrap();
        assert_eq!(report.outside_region, 1);
        assert_eq!(report.accepted, 1);
    }

    #[test]
    fn test_cancelled_batch() {
        let mut engine = BinningEngine::from_config(gaussian_config()).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = engine.bin_batch(vec![obs(0.0, 0.0, 1.0)], &cancel).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.processed(), 0);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_bin_scene_weights_by_scene() {
        let mut engine = BinningEngine::from_config(gaussian_config()).unwrap();
        let cancel = CancelToken::new();
        let scene_a = vec![obs(45.0, 90.0, 1.0); 4];
        let scene_b = vec![obs(45.0, 90.0, 4.0)];
        engine.bin_scene(&scene_a, &cancel).unwrap();
        engine.bin_scene(&scene_b, &cancel).unwrap();

        let records = engine.finalize_all().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.num_obs, 5);
        assert_eq!(record.num_scenes, 2);
        assert!((record.channels[0].mean - 1.6).abs() < 1e-12);
        assert!((record.channels[0].weighted_mean - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bin_scene_resource_exhausted_discards_scene() {
        let config = BinningConfig {
            max_bins: Some(1),
            ..gaussian_config()
        };
        let mut engine = BinningEngine::from_config(config).unwrap();
        engine.bin_scene(&[obs(45.0, 90.0, 1.0)], &CancelToken::new()).unwrap();

        let scene = vec![
            obs(45.0, 90.0, 2.0),
            obs(45.0, 90.0, 3.0),
            obs(-45.0, 90.0, 1.0),
            obs(45.0, 90.0, 4.0),
        ];
        let err = engine.bin_scene(&scene, &CancelToken::new()).unwrap_err();
        match err {
            BinningError::ResourceExhausted {
                observations,
                scene_offset,
                ..
            } => {
                assert_eq!(observations, 1);
                assert_eq!(scene_offset, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(engine.num_bins_touched(), 1);
        assert_eq!(engine.observations(), 1);
    }

    #[test]
    fn test_merge_rejects_different_grids() {
        let mut a = BinningEngine::from_config(gaussian_config()).unwrap();
        let b = BinningEngine::from_config(BinningConfig {
            grid: GridSpec::regular_gaussian(64),
            ..BinningConfig::default()
        })
        .unwrap();
        assert!(matches!(a.merge(b), Err(BinningError::GridMismatch(_))));
    }

    #[test]
    fn test_merge_unions_bins() {
        let mut a = BinningEngine::from_config(gaussian_config()).unwrap();
        let mut b = a.empty_like();
        a.bin(&obs(45.0, 90.0, 1.0)).unwrap();
        b.bin(&obs(45.0, 90.0, 3.0)).unwrap();
        b.bin(&obs(-45.0, -90.0, 5.0)).unwrap();
        a.merge(b).unwrap();

        assert_eq!(a.num_bins_touched(), 2);
        assert_eq!(a.observations(), 3);
        let records = a.finalize_all().unwrap();
        let shared = records.iter().find(|r| r.bin_index == 1026).unwrap();
        assert_eq!(shared.num_obs, 2);
        assert_eq!(shared.channels[0].mean, 2.0);
    }

    #[test]
    fn test_finalize_sorted_and_min_obs() {
        let config = BinningConfig {
            min_observations: 2,
            ..gaussian_config()
        };
        let mut engine = BinningEngine::from_config(config).unwrap();
        for lat in [60.0, -60.0, 0.0, 30.0] {
            engine.bin(&obs(lat, 0.0, 1.0)).unwrap();
            engine.bin(&obs(lat, 0.0, 1.0)).unwrap();
        }
        engine.bin(&obs(-80.0, 0.0, 1.0)).unwrap();

        let records = engine.finalize_all().unwrap();
        assert_eq!(records.len(), 4);
        assert!(records.windows(2).all(|w| w[0].bin_index < w[1].bin_index));
    }

    #[test]
    fn test_new_rejects_mismatched_resolver() {
        let resolver = Arc::new(BinIndexResolver::for_spec(GridSpec::plate_carree(90)).unwrap());
        let result = BinningEngine::new(resolver, Arc::new(gaussian_config()));
        assert!(matches!(result, Err(BinningError::GridMismatch(_))));
    }
}
