//! Product serialization.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use binning::BinRecord;
use binning_common::{BinIndex, BinningError, BinningResult};
use bytes::{BufMut, BytesMut};
use chrono::Utc;
use planetary_grid::GridGeometry;
use tracing::{info, warn};

use crate::codec::{encode_record, record_size};
use crate::header::{Compression, ProductHeader, StoreOptions, FORMAT_VERSION, MAGIC};

/// Check ordering, index range and channel count of every record.
fn validate_records(grid: &dyn GridGeometry, num_channels: usize, records: &[BinRecord]) -> BinningResult<()> {
    let num_bins = grid.num_bins();
    let mut previous: Option<BinIndex> = None;

    for (position, record) in records.iter().enumerate() {
        if record.bin_index >= num_bins {
            return Err(BinningError::out_of_range(
                "bin index",
                record.bin_index as i64,
                num_bins as i64,
            ));
        }
        if let Some(previous) = previous {
            if record.bin_index <= previous {
                return Err(BinningError::OrderingViolation {
                    position,
                    previous,
                    bin_index: record.bin_index,
                });
            }
        }
        if record.channels.len() != num_channels {
            return Err(BinningError::invalid_format(format!(
                "record for bin {} has {} channels, expected {}",
                record.bin_index,
                record.channels.len(),
                num_channels
            )));
        }
        previous = Some(record.bin_index);
    }
    Ok(())
}

fn compress(raw: &[u8], level: u32) -> BinningResult<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::new(level.min(9)));
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

/// Encode a complete product in memory.
///
/// Records must be strictly ascending by bin index and lie inside the grid.
pub fn to_bytes(
    grid: &dyn GridGeometry,
    variables: &[String],
    records: &[BinRecord],
    options: &StoreOptions,
) -> BinningResult<(ProductHeader, Vec<u8>)> {
    validate_records(grid, variables.len(), records)?;

    let mut raw = BytesMut::with_capacity(records.len() * record_size(variables.len()));
    for record in records {
        encode_record(&mut raw, record);
    }

    let payload = match options.compression {
        Compression::None => raw.to_vec(),
        Compression::Zlib => compress(&raw, options.compression_level)?,
    };

    let header = ProductHeader {
        grid: grid.spec(),
        num_rows: grid.num_rows(),
        num_bins: grid.num_bins(),
        variables: variables.to_vec(),
        record_count: records.len() as u64,
        compression: options.compression,
        created: Utc::now(),
        observation_count: options.observation_count,
    };
    let header_json = serde_json::to_vec(&header)?;

    let mut out = BytesMut::with_capacity(4 + 4 + 4 + header_json.len() + 8 + payload.len() + 4);
    out.put_slice(MAGIC);
    out.put_u32_le(FORMAT_VERSION);
    out.put_u32_le(header_json.len() as u32);
    out.put_slice(&header_json);
    out.put_u64_le(payload.len() as u64);
    out.put_slice(&payload);
    out.put_u32_le(crc32fast::hash(&payload));

    Ok((header, out.to_vec()))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a product file.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failed write never leaves a partial product at `path`. Validation errors
/// are raised before anything touches the filesystem.
pub fn write(
    path: impl AsRef<Path>,
    grid: &dyn GridGeometry,
    variables: &[String],
    records: &[BinRecord],
    options: &StoreOptions,
) -> BinningResult<ProductHeader> {
    let path = path.as_ref();
    let (header, bytes) = to_bytes(grid, variables, records, options)?;

    let tmp = temp_path(path);
    let result = fs::write(&tmp, &bytes).and_then(|_| fs::rename(&tmp, path));
    if let Err(e) = result {
        if fs::remove_file(&tmp).is_err() {
            warn!(path = %tmp.display(), "Failed to remove temporary product file");
        }
        return Err(BinningError::Io(e));
    }

    info!(
        path = %path.display(),
        grid = %header.grid,
        records = header.record_count,
        bytes = bytes.len(),
        compression = ?header.compression,
        "Wrote binned product"
    );

    Ok(header)
}
