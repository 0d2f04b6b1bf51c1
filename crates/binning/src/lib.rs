//! Level-2 to Level-3 binning engine.
//!
//! Folds a stream of geolocated observations into per-bin statistical
//! accumulators on a global grid. Accumulators merge by field-wise
//! addition, so observations may be partitioned across workers in any way
//! and reduced afterwards.
//!
//! # Architecture
//!
//! ```text
//! Observation partitions (one per swath / worker)
//!      │
//!      ▼
//! BinningEngine::bin_batch / bin_scene     (one engine per worker, no locks)
//!      │
//!      ├─► BinIndexResolver::bin_index(lat, lon)
//!      │
//!      └─► BinAccumulator::update / fold_scene
//!               │
//!               ▼
//!          BinningEngine::merge            (tree reduction)
//!               │
//!               ▼
//!          finalize_all() → sorted Vec<BinRecord>
//! ```
//!
//! # Example
//!
//! ```
//! use binning::{BinningConfig, BinningEngine};
//! use binning_common::{GridSpec, Observation};
//!
//! let config = BinningConfig {
//!     grid: GridSpec::reduced_gaussian(64),
//!     ..BinningConfig::default()
//! };
//! let mut engine = BinningEngine::from_config(config).unwrap();
//! engine.bin(&Observation::new(45.0, 90.0, vec![2.0])).unwrap();
//! engine.bin(&Observation::new(45.1, 90.2, vec![4.0])).unwrap();
//!
//! let records = engine.finalize_all().unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].bin_index, 1026);
//! assert_eq!(records[0].channels[0].mean, 3.0);
//! ```

pub mod accumulator;
pub mod config;
pub mod engine;
pub mod parallel;
pub mod record;

pub use accumulator::{check_values, BinAccumulator, ChannelAccumulator};
pub use binning_common::{BinningError, BinningResult};
pub use config::{BinningConfig, NonFinitePolicy};
pub use engine::{BatchReport, BinOutcome, BinningEngine};
pub use parallel::{bin_partitions, merge_engines, CancelToken, PartitionMode};
pub use record::{BinRecord, ChannelStatistics, Statistic};
