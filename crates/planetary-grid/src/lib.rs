//! Global binning grids.
//!
//! Defines the row layout of global grids (reduced/regular Gaussian,
//! plate carrée and the SeaWiFS sinusoidal grid) and resolves geographic
//! positions to dense bin indices and back.
//!
//! ```text
//! row 0 (north)   | 0 .. numCols(0)                     |
//! row 1           | firstBinIndex(1) .. firstBinIndex(2) |
//! ...
//! row n-1 (south) | ... numBins                         |
//! ```
//!
//! # Example
//!
//! ```
//! use binning_common::GridSpec;
//! use planetary_grid::BinIndexResolver;
//!
//! let resolver = BinIndexResolver::for_spec(GridSpec::reduced_gaussian(64)).unwrap();
//! assert_eq!(resolver.num_bins(), 6114);
//! assert_eq!(resolver.bin_index(45.0, 90.0).unwrap(), 1026);
//! ```

pub mod gaussian;
pub mod geometry;
pub mod layout;
pub mod reduced;
pub mod resolver;

pub use geometry::{
    build_grid, GridGeometry, PlateCarreeGrid, ReducedGaussianGrid, RegularGaussianGrid,
    SinusoidalGrid,
};
pub use layout::RowLayout;
pub use resolver::{find_closest_in_array, BinIndexResolver};
