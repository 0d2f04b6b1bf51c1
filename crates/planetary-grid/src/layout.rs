//! Row layout shared by all grid kinds.

use binning_common::{BinIndex, BinningError, BinningResult};
use std::sync::Arc;

/// Per-row column counts, cumulative bin offsets and row latitudes.
///
/// Rows run north to south. `first_bins` has `num_rows + 1` entries; the last
/// one is the total bin count.
#[derive(Debug, Clone)]
pub struct RowLayout {
    num_cols: Vec<usize>,
    first_bins: Vec<BinIndex>,
    center_lats: Arc<[f64]>,
}

impl RowLayout {
    /// Build a layout from per-row column counts and row latitudes.
    pub fn new(num_cols: Vec<usize>, center_lats: Arc<[f64]>) -> BinningResult<Self> {
        if num_cols.is_empty() {
            return Err(BinningError::UnsupportedGrid("grid has no rows".to_string()));
        }
        if num_cols.len() != center_lats.len() {
            return Err(BinningError::UnsupportedGrid(format!(
                "{} column counts for {} latitudes",
                num_cols.len(),
                center_lats.len()
            )));
        }
        if let Some(row) = num_cols.iter().position(|&c| c == 0) {
            return Err(BinningError::UnsupportedGrid(format!("row {} has no columns", row)));
        }

        let mut first_bins = Vec::with_capacity(num_cols.len() + 1);
        let mut total: BinIndex = 0;
        first_bins.push(total);
        for &cols in &num_cols {
            total += cols as BinIndex;
            first_bins.push(total);
        }

        Ok(Self {
            num_cols,
            first_bins,
            center_lats,
        })
    }

    /// Layout with the same column count in every row.
    pub fn uniform(num_cols: usize, center_lats: Arc<[f64]>) -> BinningResult<Self> {
        Self::new(vec![num_cols; center_lats.len()], center_lats)
    }

    pub fn num_rows(&self) -> usize {
        self.num_cols.len()
    }

    pub fn num_bins(&self) -> BinIndex {
        self.first_bins[self.num_cols.len()]
    }

    pub fn num_cols(&self, row: usize) -> BinningResult<usize> {
        self.num_cols
            .get(row)
            .copied()
            .ok_or_else(|| self.row_out_of_range(row))
    }

    /// Index of the first bin of `row`. `row == num_rows` yields `num_bins`.
    pub fn first_bin_index(&self, row: usize) -> BinningResult<BinIndex> {
        self.first_bins.get(row).copied().ok_or_else(|| {
            BinningError::out_of_range("row", row as i64, self.first_bins.len() as i64)
        })
    }

    pub fn center_lat(&self, row: usize) -> BinningResult<f64> {
        self.center_lats
            .get(row)
            .copied()
            .ok_or_else(|| self.row_out_of_range(row))
    }

    /// Row containing the bin at `offset` counted from the first (northernmost) bin.
    pub fn row_index(&self, offset: BinIndex) -> BinningResult<usize> {
        let num_bins = self.num_bins();
        if offset >= num_bins {
            return Err(BinningError::out_of_range("bin", offset as i64, num_bins as i64));
        }
        // first_bins is non-decreasing; count the row starts <= offset
        Ok(self.first_bins.partition_point(|&start| start <= offset) - 1)
    }

    /// Row latitudes, north to south.
    pub fn center_lats(&self) -> &[f64] {
        &self.center_lats
    }

    /// Column counts, north to south.
    pub fn column_counts(&self) -> &[usize] {
        &self.num_cols
    }

    fn row_out_of_range(&self, row: usize) -> BinningError {
        BinningError::out_of_range("row", row as i64, self.num_cols.len() as i64)
    }
}
