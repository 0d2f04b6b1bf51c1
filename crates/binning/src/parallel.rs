//! Partitioned parallel binning.
//!
//! Each partition is binned by its own engine on the rayon pool, then the
//! engines are combined pairwise in a tree.

use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use binning_common::{BinningError, BinningResult, Observation};
use planetary_grid::BinIndexResolver;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::BinningConfig;
use crate::engine::{BatchReport, BinningEngine};

/// Cooperative cancellation flag shared between a controller and workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How the observations of one partition are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionMode {
    /// Every observation is independent.
    #[default]
    Batch,
    /// The partition is one scene, weighted by `sqrt(n)` per bin.
    Scene,
}

impl PartitionMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "batch" => Some(Self::Batch),
            "scene" => Some(Self::Scene),
            _ => None,
        }
    }
}

/// Bin every partition on its own engine and merge the results.
///
/// Returns the merged engine and the summed report. With no partitions the
/// engine is empty.
pub fn bin_partitions<P>(
    resolver: Arc<BinIndexResolver>,
    config: Arc<BinningConfig>,
    partitions: Vec<P>,
    mode: PartitionMode,
    cancel: &CancelToken,
) -> BinningResult<(BinningEngine, BatchReport)>
where
    P: IntoIterator + Send,
    P::Item: Borrow<Observation>,
{
    let num_partitions = partitions.len();
    let empty = BinningEngine::new(Arc::clone(&resolver), Arc::clone(&config))?;

    let merged = partitions
        .into_par_iter()
        .map(|partition| {
            let mut engine = empty.empty_like();
            let report = match mode {
                PartitionMode::Batch => engine.bin_batch(partition, cancel)?,
                PartitionMode::Scene => engine.bin_scene(partition, cancel)?,
            };
            Ok::<_, BinningError>((engine, report))
        })
        .try_reduce_with(|(mut left, mut left_report), (right, right_report)| {
            left.merge(right)?;
            left_report.merge(&right_report);
            Ok::<_, BinningError>((left, left_report))
        });

    let (engine, report) = match merged {
        Some(result) => result?,
        None => (empty, BatchReport::default()),
    };

    info!(
        partitions = num_partitions,
        accepted = report.accepted,
        rejected = report.rejected,
        outside_region = report.outside_region,
        cancelled = report.cancelled,
        bins = engine.num_bins_touched(),
        "Binned partitions"
    );

    Ok((engine, report))
}

/// Tree-merge a set of engines on the rayon pool.
///
/// Returns `None` for an empty input.
pub fn merge_engines(engines: Vec<BinningEngine>) -> BinningResult<Option<BinningEngine>> {
    engines
        .into_par_iter()
        .map(Ok::<_, BinningError>)
        .try_reduce_with(|mut left, right| {
            left.merge(right)?;
            Ok(left)
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use binning_common::GridSpec;

    fn setup() -> (Arc<BinIndexResolver>, Arc<BinningConfig>) {
        let config = BinningConfig {
            grid: GridSpec::plate_carree(90),
            ..BinningConfig::default()
        };
        let resolver = BinIndexResolver::for_spec(config.grid).unwrap();
        (Arc::new(resolver), Arc::new(config))
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_no_partitions() {
        let (resolver, config) = setup();
        let partitions: Vec<Vec<Observation>> = Vec::new();
        let (engine, report) =
            bin_partitions(resolver, config, partitions, PartitionMode::Batch, &CancelToken::new()).unwrap();
        assert!(engine.is_empty());
        assert_eq!(report, BatchReport::default());
    }

    #[test]
    fn test_partitions_merge_counts() {
        let (resolver, config) = setup();
        let partitions = vec![
            vec![Observation::new(10.0, 10.0, vec![1.0]); 3],
            vec![Observation::new(10.0, 10.0, vec![3.0])],
            vec![Observation::new(-10.0, 10.0, vec![3.0]), Observation::new(91.0, 0.0, vec![0.0])],
        ];
        let (engine, report) =
            bin_partitions(resolver, config, partitions, PartitionMode::Batch, &CancelToken::new()).unwrap();
        assert_eq!(report.accepted, 5);
        assert_eq!(report.rejected, 1);
        assert_eq!(engine.observations(), 5);
        assert_eq!(engine.num_bins_touched(), 2);
    }

    #[test]
    fn test_merge_engines_empty() {
        assert!(merge_engines(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn test_partition_mode_parse() {
        assert_eq!(PartitionMode::parse("Scene"), Some(PartitionMode::Scene));
        assert_eq!(PartitionMode::parse("batch"), Some(PartitionMode::Batch));
        assert_eq!(PartitionMode::parse("swath"), None);
    }
}
