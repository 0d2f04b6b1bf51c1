//! Reference layouts for the N32 Gaussian grids and grid-wide invariants.

use binning_common::GridSpec;
use planetary_grid::{build_grid, BinIndexResolver, GridGeometry};
use test_utils::{assert_approx_eq, assert_coords_approx_eq};

fn reduced() -> BinIndexResolver {
    BinIndexResolver::for_spec(GridSpec::reduced_gaussian(64)).expect("reduced N32 grid")
}

fn regular() -> BinIndexResolver {
    BinIndexResolver::for_spec(GridSpec::regular_gaussian(64)).expect("regular N32 grid")
}

// ============================================================================
// Reduced Gaussian, 64 rows
// ============================================================================

#[test]
fn test_reduced_row_layout() {
    let resolver = reduced();
    let grid = resolver.grid();

    assert_eq!(grid.num_rows(), 64);
    assert_eq!(grid.num_cols(0).unwrap(), 20);
    assert_eq!(grid.num_cols(10).unwrap(), 80);
    assert_eq!(grid.num_cols(32).unwrap(), 128);
    assert_eq!(grid.num_cols(63).unwrap(), 20);
    assert!(grid.num_cols(64).is_err());
}

#[test]
fn test_reduced_bin_offsets() {
    let grid = reduced().grid().clone();

    assert_eq!(grid.num_bins(), 6114);
    assert_eq!(grid.first_bin_index(0).unwrap(), 0);
    assert_eq!(grid.first_bin_index(10).unwrap(), 489);
    assert_eq!(grid.first_bin_index(50).unwrap(), 5269);
    assert_eq!(grid.row_index(20).unwrap(), 1);
    assert_eq!(grid.row_index(270).unwrap(), 6);
}

#[test]
fn test_reduced_latitudes() {
    let grid = reduced().grid().clone();

    assert_approx_eq!(grid.center_lat(50).unwrap(), -51.625_733_7, 1e-6);
    assert_approx_eq!(grid.center_lat(63).unwrap(), -87.863_798_8, 1e-6);
    assert_eq!(grid.center_lat(0).unwrap(), -grid.center_lat(63).unwrap());
}

#[test]
fn test_reduced_bin_lookup() {
    let resolver = reduced();

    let (lat, lon) = resolver.center_lat_lon(300).unwrap();
    assert_approx_eq!(lat, 68.367_756_1, 1e-6);
    assert_approx_eq!(lon, -53.4375, 1e-9);

    assert_eq!(resolver.bin_index(45.0, 90.0).unwrap(), 1026);
}

// ============================================================================
// Regular Gaussian, 64 rows
// ============================================================================

#[test]
fn test_regular_layout() {
    let resolver = regular();
    let grid = resolver.grid();

    for row in 0..grid.num_rows() {
        assert_eq!(grid.num_cols(row).unwrap(), 128);
    }
    assert_eq!(grid.row_index(270).unwrap(), 2);
    assert_eq!(grid.num_bins(), 8192);
    assert_eq!(grid.first_bin_index(10).unwrap(), 1280);
    assert_eq!(grid.first_bin_index(50).unwrap(), 6400);
}

#[test]
fn test_regular_bin_lookup() {
    let resolver = regular();

    let (lat, lon) = resolver.center_lat_lon(300).unwrap();
    assert_coords_approx_eq!((lat, lon), (82.31291, -54.84375), 1e-5);

    assert_eq!(resolver.bin_index(45.0, 90.0).unwrap(), 2016);
}

// ============================================================================
// Sinusoidal (SEA) grid
// ============================================================================

#[test]
fn test_sinusoidal_9km_bin_count() {
    let grid = build_grid(GridSpec::sinusoidal(2160)).unwrap();
    assert_eq!(grid.num_bins(), 5_940_422);
    assert_eq!(grid.num_cols(1079).unwrap(), 4320);
}

// ============================================================================
// Invariants over every grid kind
// ============================================================================

fn all_grids() -> Vec<BinIndexResolver> {
    [
        GridSpec::reduced_gaussian(64),
        GridSpec::regular_gaussian(64),
        GridSpec::regular_gaussian(160),
        GridSpec::plate_carree(180),
        GridSpec::sinusoidal(180),
    ]
    .into_iter()
    .map(|spec| BinIndexResolver::for_spec(spec).unwrap())
    .collect()
}

/// Deterministic sweep of positions, including the poles and the dateline.
fn sample_positions() -> Vec<(f64, f64)> {
    let mut positions = Vec::new();
    let mut lat = -90.0;
    while lat <= 90.0 {
        let mut lon = -540.0;
        while lon <= 540.0 {
            positions.push((lat, lon));
            lon += 7.3;
        }
        lat += 1.7;
    }
    positions.extend([(90.0, 180.0), (-90.0, -180.0), (0.0, 179.999_999), (0.0, -180.0)]);
    positions
}

#[test]
fn test_offsets_are_cumulative_column_counts() {
    for resolver in all_grids() {
        let grid = resolver.grid();
        for row in 0..grid.num_rows() {
            let delta = grid.first_bin_index(row + 1).unwrap() - grid.first_bin_index(row).unwrap();
            assert_eq!(delta, grid.num_cols(row).unwrap() as u64);
        }
        assert_eq!(grid.first_bin_index(grid.num_rows()).unwrap(), grid.num_bins());
    }
}

#[test]
fn test_bin_index_in_range() {
    for resolver in all_grids() {
        for &(lat, lon) in &sample_positions() {
            let bin = resolver.bin_index(lat, lon).unwrap();
            assert!(bin < resolver.num_bins(), "{} out of range for {}", bin, resolver.spec());
        }
    }
}

#[test]
fn test_center_round_trip() {
    for resolver in all_grids() {
        for &(lat, lon) in &sample_positions() {
            let bin = resolver.bin_index(lat, lon).unwrap();
            let (clat, clon) = resolver.center_lat_lon(bin).unwrap();
            assert_eq!(
                resolver.bin_index(clat, clon).unwrap(),
                bin,
                "round trip failed at ({}, {}) on {}",
                lat,
                lon,
                resolver.spec()
            );
        }
    }
}

#[test]
fn test_every_bin_center_maps_to_itself() {
    let resolver = reduced();
    for bin in 0..resolver.num_bins() {
        let (lat, lon) = resolver.center_lat_lon(bin).unwrap();
        assert_eq!(resolver.bin_index(lat, lon).unwrap(), bin);
    }
}

#[test]
fn test_row_index_inverts_offsets() {
    for resolver in all_grids() {
        let grid = resolver.grid();
        for row in 0..grid.num_rows() {
            let first = grid.first_bin_index(row).unwrap();
            let last = grid.first_bin_index(row + 1).unwrap() - 1;
            assert_eq!(grid.row_index(first).unwrap(), row);
            assert_eq!(grid.row_index(last).unwrap(), row);
        }
        assert!(grid.row_index(grid.num_bins()).is_err());
    }
}
