//! Reconstruction of gridded views from a product.

use binning::{BinRecord, Statistic};
use binning_common::{BinningError, BinningResult, BoundingBox};

use crate::reader::BinnedProduct;

/// Ragged raster with one row per grid row and the grid's own row widths.
#[derive(Debug, Clone, PartialEq)]
pub struct BinRaster {
    rows: Vec<Vec<f64>>,
}

impl BinRaster {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row)?.get(col).copied()
    }

    /// Total number of cells, equal to the grid's bin count.
    pub fn num_cells(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }
}

/// Equirectangular raster, north-up, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateCarreeRaster {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl PlateCarreeRaster {
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }
}

impl BinnedProduct {
    /// Fill the grid's ragged raster with one statistic of one variable.
    ///
    /// Cells of bins without a record hold `fill`.
    pub fn to_raster(&self, variable: &str, statistic: Statistic, fill: f64) -> BinningResult<BinRaster> {
        let channel = self.require_variable(variable)?;
        let grid = self.read_grid();

        let mut rows = (0..grid.num_rows())
            .map(|row| Ok(vec![fill; grid.num_cols(row)?]))
            .collect::<BinningResult<Vec<_>>>()?;

        for record in self.read_records() {
            let (row, col) = self.resolver().row_col(record.bin_index)?;
            rows[row][col] = record.channels[channel].get(statistic);
        }

        Ok(BinRaster { rows })
    }

    /// Resample onto a `width` x `height` equirectangular raster covering the
    /// globe. Each pixel takes the value of the bin containing its center.
    pub fn to_plate_carree(
        &self,
        variable: &str,
        statistic: Statistic,
        width: usize,
        height: usize,
        fill: f64,
    ) -> BinningResult<PlateCarreeRaster> {
        if width == 0 || height == 0 {
            return Err(BinningError::Config(format!(
                "raster size must be positive, got {}x{}",
                width, height
            )));
        }
        let channel = self.require_variable(variable)?;
        let resolver = self.resolver();
        let grid = resolver.grid();

        let dlat = 180.0 / height as f64;
        let dlon = 360.0 / width as f64;
        let mut data = vec![fill; width * height];

        for y in 0..height {
            let lat = 90.0 - (y as f64 + 0.5) * dlat;
            let row = resolver.row_for_lat(lat);
            let first = grid.first_bin_index(row)?;

            // Neighbouring pixels usually share a bin
            let mut cached: Option<(u64, f64)> = None;
            for x in 0..width {
                let lon = -180.0 + (x as f64 + 0.5) * dlon;
                let bin_index = first + resolver.col_for_lon(row, lon)? as u64;
                let value = match cached {
                    Some((bin, value)) if bin == bin_index => value,
                    _ => {
                        let value = self
                            .find_record(bin_index)
                            .map(|r| r.channels[channel].get(statistic))
                            .unwrap_or(fill);
                        cached = Some((bin_index, value));
                        value
                    }
                };
                data[y * width + x] = value;
            }
        }

        Ok(PlateCarreeRaster { width, height, data })
    }

    /// Records of the bins overlapping `region`, in ascending order.
    pub fn records_in_region(&self, region: &BoundingBox) -> BinningResult<Vec<BinRecord>> {
        let resolver = self.resolver();
        let grid = resolver.grid();

        let north = resolver.row_for_lat(region.max_lat.min(90.0));
        let south = resolver.row_for_lat(region.min_lat.max(-90.0));

        let spans: Vec<(f64, f64)> = if region.crosses_antimeridian() {
            vec![(-180.0, region.max_lon), (region.min_lon, 180.0)]
        } else {
            vec![(region.min_lon, region.max_lon)]
        };

        let mut out = Vec::new();
        for row in north.min(south)..=north.max(south) {
            let first = grid.first_bin_index(row)?;
            let columns = spans
                .iter()
                .map(|&(lon_min, lon_max)| resolver.column_range(row, lon_min, lon_max))
                .collect::<BinningResult<Vec<_>>>()?;
            for (c0, c1) in merge_column_spans(columns) {
                out.extend(self.records_between(first + c0 as u64, first + c1 as u64));
            }
        }
        Ok(out)
    }
}

/// Sort inclusive column spans and join the ones that overlap or touch.
fn merge_column_spans(mut spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    spans.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (c0, c1) in spans {
        match merged.last_mut() {
            Some(last) if c0 <= last.1 + 1 => last.1 = last.1.max(c1),
            _ => merged.push((c0, c1)),
        }
    }
    merged
}
