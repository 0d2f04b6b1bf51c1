//! Grid kinds and the geometry capability they share.

use binning_common::{BinIndex, BinningError, BinningResult, GridKind, GridSpec};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::gaussian::gaussian_latitudes;
use crate::layout::RowLayout;
use crate::reduced;

/// Row/column layout of a global grid.
///
/// Every kind exposes the same queries; only construction differs.
pub trait GridGeometry: Send + Sync + fmt::Debug {
    /// The specification this grid was built from.
    fn spec(&self) -> GridSpec;

    /// The computed row layout.
    fn layout(&self) -> &RowLayout;

    fn num_rows(&self) -> usize {
        self.layout().num_rows()
    }

    fn num_cols(&self, row: usize) -> BinningResult<usize> {
        self.layout().num_cols(row)
    }

    fn first_bin_index(&self, row: usize) -> BinningResult<BinIndex> {
        self.layout().first_bin_index(row)
    }

    fn center_lat(&self, row: usize) -> BinningResult<f64> {
        self.layout().center_lat(row)
    }

    fn row_index(&self, offset: BinIndex) -> BinningResult<usize> {
        self.layout().row_index(offset)
    }

    fn num_bins(&self) -> BinIndex {
        self.layout().num_bins()
    }
}

/// Build the grid described by `spec`.
pub fn build_grid(spec: GridSpec) -> BinningResult<Arc<dyn GridGeometry>> {
    let grid: Arc<dyn GridGeometry> = match spec.kind {
        GridKind::ReducedGaussian => Arc::new(ReducedGaussianGrid::new(spec.num_rows)?),
        GridKind::RegularGaussian => Arc::new(RegularGaussianGrid::new(spec.num_rows)?),
        GridKind::PlateCarree => Arc::new(PlateCarreeGrid::new(spec.num_rows)?),
        GridKind::Sinusoidal => Arc::new(SinusoidalGrid::new(spec.num_rows)?),
    };
    tracing::debug!(grid = %spec, num_bins = grid.num_bins(), "Built binning grid");
    Ok(grid)
}

fn require_even_rows(kind: GridKind, num_rows: usize) -> BinningResult<()> {
    if num_rows == 0 || num_rows % 2 != 0 {
        return Err(BinningError::UnsupportedGrid(format!(
            "{} grid needs a positive even row count, got {}",
            kind, num_rows
        )));
    }
    Ok(())
}

/// Equally spaced row latitudes, north to south.
fn equal_angle_latitudes(num_rows: usize) -> Arc<[f64]> {
    let dlat = 180.0 / num_rows as f64;
    (0..num_rows)
        .map(|row| 90.0 - (row as f64 + 0.5) * dlat)
        .collect::<Vec<_>>()
        .into()
}

/// Reduced Gaussian grid: Gaussian latitudes with the published per-row
/// column counts.
#[derive(Debug)]
pub struct ReducedGaussianGrid {
    layout: RowLayout,
}

impl ReducedGaussianGrid {
    pub fn new(num_rows: usize) -> BinningResult<Self> {
        require_even_rows(GridKind::ReducedGaussian, num_rows)?;
        let cols = reduced::reduced_columns(num_rows).ok_or_else(|| {
            BinningError::UnsupportedGrid(format!(
                "no reduced Gaussian column table for {} rows (available: {:?})",
                num_rows,
                reduced::SUPPORTED_ROW_COUNTS
            ))
        })?;
        let layout = RowLayout::new(cols, gaussian_latitudes(num_rows))?;
        Ok(Self { layout })
    }
}

impl GridGeometry for ReducedGaussianGrid {
    fn spec(&self) -> GridSpec {
        GridSpec::reduced_gaussian(self.layout.num_rows())
    }

    fn layout(&self) -> &RowLayout {
        &self.layout
    }
}

/// Regular Gaussian grid: Gaussian latitudes, `2 * num_rows` columns per row.
#[derive(Debug)]
pub struct RegularGaussianGrid {
    layout: RowLayout,
}

impl RegularGaussianGrid {
    pub fn new(num_rows: usize) -> BinningResult<Self> {
        require_even_rows(GridKind::RegularGaussian, num_rows)?;
        let layout = RowLayout::uniform(2 * num_rows, gaussian_latitudes(num_rows))?;
        Ok(Self { layout })
    }
}

impl GridGeometry for RegularGaussianGrid {
    fn spec(&self) -> GridSpec {
        GridSpec::regular_gaussian(self.layout.num_rows())
    }

    fn layout(&self) -> &RowLayout {
        &self.layout
    }
}

/// Plate carrée grid: equally spaced latitudes, `2 * num_rows` columns per row.
#[derive(Debug)]
pub struct PlateCarreeGrid {
    layout: RowLayout,
}

impl PlateCarreeGrid {
    pub fn new(num_rows: usize) -> BinningResult<Self> {
        if num_rows == 0 {
            return Err(BinningError::UnsupportedGrid(
                "plate_carree grid needs at least one row".to_string(),
            ));
        }
        let layout = RowLayout::uniform(2 * num_rows, equal_angle_latitudes(num_rows))?;
        Ok(Self { layout })
    }
}

impl GridGeometry for PlateCarreeGrid {
    fn spec(&self) -> GridSpec {
        GridSpec::plate_carree(self.layout.num_rows())
    }

    fn layout(&self) -> &RowLayout {
        &self.layout
    }
}

/// SeaWiFS integerized sinusoidal grid.
///
/// Rows are equally spaced; each row holds `round(2 * num_rows * cos(lat))`
/// bins so that all bins have roughly the same area. Column counts use a
/// single-precision row latitude, matching SeaDAS Level-3 bin files.
#[derive(Debug)]
pub struct SinusoidalGrid {
    layout: RowLayout,
}

impl SinusoidalGrid {
    pub fn new(num_rows: usize) -> BinningResult<Self> {
        if num_rows == 0 {
            return Err(BinningError::UnsupportedGrid(
                "sinusoidal grid needs at least one row".to_string(),
            ));
        }
        let n = num_rows as f64;
        let cols = (0..num_rows)
            .map(|row| {
                // South-up row numbering as in the bin files
                let south_row = (num_rows - 1 - row) as f64;
                let lat = ((south_row + 0.5) * (180.0 / n) - 90.0) as f32;
                let cols = ((lat as f64 * PI / 180.0).cos() * (2.0 * n) + 0.5) as usize;
                cols.max(1)
            })
            .collect();
        let layout = RowLayout::new(cols, equal_angle_latitudes(num_rows))?;
        Ok(Self { layout })
    }
}

impl GridGeometry for SinusoidalGrid {
    fn spec(&self) -> GridSpec {
        GridSpec::sinusoidal(self.layout.num_rows())
    }

    fn layout(&self) -> &RowLayout {
        &self.layout
    }
}
