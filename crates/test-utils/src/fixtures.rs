//! Common test fixtures for binning tests.
//!
//! This module provides pre-defined grids, regions and scratch locations
//! shared across the test suites.

use std::path::PathBuf;

/// Common bounding box definitions for testing, as
/// `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Sargasso Sea
    pub const SARGASSO: (f64, f64, f64, f64) = (-70.0, 20.0, -40.0, 35.0);

    /// Crosses antimeridian (Pacific-centric)
    pub const PACIFIC: (f64, f64, f64, f64) = (160.0, -50.0, -140.0, 50.0);
}

/// Common grid specifications for testing.
pub mod grid {
    use binning_common::GridSpec;

    /// ECMWF N32 reduced Gaussian grid (6114 bins)
    pub fn reduced_n32() -> GridSpec {
        GridSpec::reduced_gaussian(64)
    }

    /// Regular Gaussian grid with 64 rows (8192 bins)
    pub fn regular_64() -> GridSpec {
        GridSpec::regular_gaussian(64)
    }

    /// One-degree plate carrée grid
    pub fn one_degree() -> GridSpec {
        GridSpec::plate_carree(180)
    }

    /// Coarse SEA grid with 180 rows (41252 bins)
    pub fn sea_180() -> GridSpec {
        GridSpec::sinusoidal(180)
    }

    /// The 9 km SEA grid used for ocean colour products (5,940,422 bins)
    pub fn sea_9km() -> GridSpec {
        GridSpec::sinusoidal(2160)
    }

    /// Every grid that is cheap enough to build in a unit test.
    pub fn small_grids() -> Vec<GridSpec> {
        vec![reduced_n32(), regular_64(), one_degree(), sea_180()]
    }
}

/// Product file names for classification tests.
pub mod names {
    /// Binned products
    pub const BINNED: [&str; 4] = [
        "A2010001.L3b_DAY_CHL.l3b",
        "S19980011998031.L3b_MO_SST.L3B",
        "modis-aqua-bins.l3b",
        "T2020100.L3b_8D_RRS.x.l3b",
    ];

    /// Anything else
    pub const NOT_BINNED: [&str; 4] = [
        "A2010001.L3m_DAY_CHL.nc",
        "A2010001.L2_LAC_OC.l3b.nc",
        "chlorophyll.l3b",
        "gfs_20240115_00z_f003.grib2",
    ];
}

/// Create a scratch directory that is removed when dropped.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create scratch directory")
}

/// Path for a product file inside `dir`.
pub fn product_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_grids_have_rows() {
        for spec in grid::small_grids() {
            assert!(spec.num_rows > 0);
        }
    }

    #[test]
    fn test_scratch_dir() {
        let dir = scratch_dir();
        let path = product_path(&dir, "x.l3b");
        assert!(path.starts_with(dir.path()));
    }
}
