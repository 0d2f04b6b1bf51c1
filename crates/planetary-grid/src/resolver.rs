//! Geographic position to bin index resolution.

use binning_common::{normalize_lon, BinIndex, BinningError, BinningResult, GridSpec};
use std::sync::Arc;

use crate::geometry::{build_grid, GridGeometry};

/// Index of the element of an ascending array closest to `target`.
///
/// Ties go to the lower index. Targets beyond either end clamp to the first
/// or last element. Returns `None` only for an empty array.
pub fn find_closest_in_array(sorted: &[f64], target: f64) -> Option<usize> {
    if sorted.is_empty() {
        return None;
    }

    let upper = sorted.partition_point(|&v| v < target);
    if upper == 0 {
        return Some(0);
    }
    if upper == sorted.len() {
        return Some(sorted.len() - 1);
    }

    let lower = upper - 1;
    if target - sorted[lower] <= sorted[upper] - target {
        Some(lower)
    } else {
        Some(upper)
    }
}

/// Converts between geographic positions and bin indices of one grid.
#[derive(Debug, Clone)]
pub struct BinIndexResolver {
    grid: Arc<dyn GridGeometry>,
    /// Row latitudes in ascending order (south to north).
    ascending_lats: Vec<f64>,
}

impl BinIndexResolver {
    /// Create a resolver over an existing grid.
    pub fn new(grid: Arc<dyn GridGeometry>) -> Self {
        let mut ascending_lats = grid.layout().center_lats().to_vec();
        ascending_lats.reverse();
        Self {
            grid,
            ascending_lats,
        }
    }

    /// Build the grid for `spec` and wrap it.
    pub fn for_spec(spec: GridSpec) -> BinningResult<Self> {
        Ok(Self::new(build_grid(spec)?))
    }

    pub fn grid(&self) -> &Arc<dyn GridGeometry> {
        &self.grid
    }

    pub fn spec(&self) -> GridSpec {
        self.grid.spec()
    }

    pub fn num_bins(&self) -> BinIndex {
        self.grid.num_bins()
    }

    /// Bin containing the position `(lat, lon)`.
    pub fn bin_index(&self, lat: f64, lon: f64) -> BinningResult<BinIndex> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(BinningError::invalid_observation(format!(
                "non-finite position ({}, {})",
                lat, lon
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(BinningError::invalid_observation(format!(
                "latitude {} outside [-90, 90]",
                lat
            )));
        }

        let row = self.row_for_lat(lat);
        let col = self.col_for_lon(row, lon)?;
        Ok(self.grid.first_bin_index(row)? + col as BinIndex)
    }

    /// Representative center `(lat, lon)` of a bin.
    pub fn center_lat_lon(&self, bin: BinIndex) -> BinningResult<(f64, f64)> {
        let (row, col) = self.row_col(bin)?;
        let width = self.column_width(row)?;
        let lon = -180.0 + (col as f64 + 0.5) * width;
        Ok((self.grid.center_lat(row)?, lon))
    }

    /// Row and column of a bin.
    pub fn row_col(&self, bin: BinIndex) -> BinningResult<(usize, usize)> {
        let row = self.grid.row_index(bin)?;
        let col = bin - self.grid.first_bin_index(row)?;
        Ok((row, col as usize))
    }

    /// Longitudinal width of the bins in `row`, in degrees.
    pub fn column_width(&self, row: usize) -> BinningResult<f64> {
        Ok(360.0 / self.grid.num_cols(row)? as f64)
    }

    /// Nearest row to `lat`; exact ties go to the lower row index.
    pub fn row_for_lat(&self, lat: f64) -> usize {
        let n = self.ascending_lats.len();
        // Layouts are never empty, so the lookup always yields an index
        let mut i = find_closest_in_array(&self.ascending_lats, lat).unwrap_or(0);
        if i + 1 < n
            && (self.ascending_lats[i + 1] - lat).abs() == (self.ascending_lats[i] - lat).abs()
        {
            i += 1;
        }
        n - 1 - i
    }

    /// Column of `lon` within `row`, clamped to the row.
    pub fn col_for_lon(&self, row: usize, lon: f64) -> BinningResult<usize> {
        let num_cols = self.grid.num_cols(row)?;
        let width = 360.0 / num_cols as f64;
        let col = ((normalize_lon(lon) + 180.0) / width).floor();
        Ok((col.max(0.0) as usize).min(num_cols - 1))
    }

    /// Inclusive column span of `row` covering the longitudes `[lon_min, lon_max]`.
    pub fn column_range(
        &self,
        row: usize,
        lon_min: f64,
        lon_max: f64,
    ) -> BinningResult<(usize, usize)> {
        let first = self.col_for_lon(row, lon_min.max(-180.0))?;
        let num_cols = self.grid.num_cols(row)?;
        let last = if lon_max >= 180.0 {
            num_cols - 1
        } else {
            self.col_for_lon(row, lon_max)?
        };
        Ok((first, last.max(first)))
    }
}
