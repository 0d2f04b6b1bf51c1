//! Common types and errors shared across the binning crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod observation;

pub use bbox::{BboxParseError, BoundingBox};
pub use error::{BinningError, BinningResult};
pub use grid::{GridKind, GridSpec};
pub use observation::{normalize_lon, Observation};

/// Dense, row-major bin address in `[0, num_bins)`.
pub type BinIndex = u64;
