//! Column counts of the ECMWF reduced Gaussian grids.
//!
//! The reduced grids are published tables, not a closed-form rule. Each
//! table lists the northern hemisphere from the pole to the equator; the
//! southern hemisphere mirrors it.

/// N32 (64 rows, 6114 points).
const N32_COLUMNS: [usize; 32] = [
    20, 27, 36, 40, 45, 50, 60, 64, 72, 75, 80, 90, 90, 96, 100, 108, //
    108, 120, 120, 120, 128, 128, 128, 128, 128, 128, 128, 128, 128, 128, 128, 128,
];

/// Row counts for which a reduced table ships with this crate.
pub const SUPPORTED_ROW_COUNTS: &[usize] = &[64];

/// Northern-hemisphere column counts (pole first) for a reduced grid with
/// `num_rows` rows, if the table is available.
pub fn hemisphere_columns(num_rows: usize) -> Option<&'static [usize]> {
    match num_rows {
        64 => Some(&N32_COLUMNS),
        _ => None,
    }
}

/// Full north-to-south column counts for a reduced grid.
pub fn reduced_columns(num_rows: usize) -> Option<Vec<usize>> {
    let half = hemisphere_columns(num_rows)?;
    let mut cols = Vec::with_capacity(num_rows);
    cols.extend_from_slice(half);
    cols.extend(half.iter().rev());
    Some(cols)
}
