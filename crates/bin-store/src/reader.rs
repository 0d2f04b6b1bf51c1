//! Product deserialization and record access.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use binning::{BinRecord, Statistic};
use binning_common::{BinIndex, BinningError, BinningResult};
use bytes::{Buf, Bytes};
use planetary_grid::{BinIndexResolver, GridGeometry};
use tracing::debug;

use crate::codec::{decode_record, peek_bin_index, record_size};
use crate::header::{Compression, ProductHeader, FORMAT_VERSION, MAGIC};

/// An opened product: validated header and decoded (decompressed) payload.
#[derive(Debug, Clone)]
pub struct BinnedProduct {
    header: ProductHeader,
    payload: Bytes,
    resolver: Arc<BinIndexResolver>,
}

fn take(buf: &mut Bytes, n: usize, what: &str) -> BinningResult<Bytes> {
    if buf.remaining() < n {
        return Err(BinningError::invalid_format(format!(
            "truncated {}: need {} bytes, have {}",
            what,
            n,
            buf.remaining()
        )));
    }
    Ok(buf.split_to(n))
}

/// Inflate a zlib payload, reading at most one byte past `expected_len`.
fn decompress(stored: &[u8], expected_len: usize) -> BinningResult<Vec<u8>> {
    let limit = u64::try_from(expected_len).unwrap_or(u64::MAX).saturating_add(1);
    let mut decoder = flate2::read::ZlibDecoder::new(stored).take(limit);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| BinningError::invalid_format(format!("payload decompression failed: {}", e)))?;
    Ok(raw)
}

impl BinnedProduct {
    /// Read and validate a product file.
    pub fn open(path: impl AsRef<Path>) -> BinningResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let product = Self::from_bytes(Bytes::from(bytes))?;
        debug!(
            path = %path.display(),
            records = product.header.record_count,
            grid = %product.header.grid,
            "Opened binned product"
        );
        Ok(product)
    }

    /// Parse and validate a product held in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> BinningResult<Self> {
        let mut buf: Bytes = bytes.into();

        let magic = take(&mut buf, 4, "magic")?;
        if &magic[..] != MAGIC {
            return Err(BinningError::invalid_format("not a binned product (bad magic)"));
        }

        let version = take(&mut buf, 4, "version")?.get_u32_le();
        if version != FORMAT_VERSION {
            return Err(BinningError::invalid_format(format!(
                "unsupported format version {}",
                version
            )));
        }

        let header_len = take(&mut buf, 4, "header length")?.get_u32_le() as usize;
        let header_json = take(&mut buf, header_len, "header")?;
        let header: ProductHeader = serde_json::from_slice(&header_json)?;

        let payload_len = take(&mut buf, 8, "payload length")?.get_u64_le();
        let payload_len = usize::try_from(payload_len)
            .map_err(|_| BinningError::invalid_format(format!("payload length {} too large", payload_len)))?;
        let stored = take(&mut buf, payload_len, "payload")?;
        let expected = take(&mut buf, 4, "checksum")?.get_u32_le();
        if buf.has_remaining() {
            return Err(BinningError::invalid_format(format!(
                "{} trailing bytes after checksum",
                buf.remaining()
            )));
        }

        let actual = crc32fast::hash(&stored);
        if actual != expected {
            return Err(BinningError::ChecksumMismatch { expected, actual });
        }

        let expected_len = usize::try_from(header.record_count)
            .ok()
            .and_then(|count| count.checked_mul(record_size(header.variables.len())))
            .ok_or_else(|| {
                BinningError::invalid_format(format!(
                    "record count {} with {} variables does not fit in memory",
                    header.record_count,
                    header.variables.len()
                ))
            })?;

        let payload = match header.compression {
            Compression::None => stored,
            Compression::Zlib => Bytes::from(decompress(&stored, expected_len)?),
        };

        if payload.len() != expected_len {
            return Err(BinningError::invalid_format(format!(
                "payload holds {} bytes, {} records need {}",
                payload.len(),
                header.record_count,
                expected_len
            )));
        }

        let resolver = BinIndexResolver::for_spec(header.grid)?;
        if resolver.num_bins() != header.num_bins {
            return Err(BinningError::invalid_format(format!(
                "header claims {} bins, {} has {}",
                header.num_bins,
                header.grid,
                resolver.num_bins()
            )));
        }

        Ok(Self {
            header,
            payload,
            resolver: Arc::new(resolver),
        })
    }

    pub fn header(&self) -> &ProductHeader {
        &self.header
    }

    pub fn variables(&self) -> &[String] {
        &self.header.variables
    }

    pub fn record_count(&self) -> usize {
        self.header.record_count as usize
    }

    /// The grid the product was binned on.
    pub fn read_grid(&self) -> Arc<dyn GridGeometry> {
        Arc::clone(self.resolver.grid())
    }

    pub fn resolver(&self) -> &Arc<BinIndexResolver> {
        &self.resolver
    }

    /// Iterate the records in ascending bin order.
    ///
    /// Records are decoded on demand; each call starts from the beginning.
    pub fn read_records(&self) -> RecordIter {
        RecordIter {
            payload: self.payload.clone(),
            num_channels: self.header.variables.len(),
            remaining: self.record_count(),
        }
    }

    /// Position of the first record whose bin index is not below `bin_index`.
    pub(crate) fn lower_bound(&self, bin_index: BinIndex) -> usize {
        let size = record_size(self.header.variables.len());
        let mut lo = 0usize;
        let mut hi = self.record_count();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if peek_bin_index(&self.payload, mid * size) < bin_index {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Decode the record at `position`.
    pub(crate) fn record_at(&self, position: usize) -> BinRecord {
        let size = record_size(self.header.variables.len());
        let mut record = &self.payload[position * size..(position + 1) * size];
        decode_record(&mut record, self.header.variables.len())
    }

    /// Record of a bin, found by binary search over the sorted payload.
    pub fn find_record(&self, bin_index: BinIndex) -> Option<BinRecord> {
        let position = self.lower_bound(bin_index);
        if position >= self.record_count() {
            return None;
        }
        let size = record_size(self.header.variables.len());
        if peek_bin_index(&self.payload, position * size) != bin_index {
            return None;
        }
        Some(self.record_at(position))
    }

    /// Records with bin indices in `[first, last]`.
    pub(crate) fn records_between(&self, first: BinIndex, last: BinIndex) -> impl Iterator<Item = BinRecord> + '_ {
        let start = self.lower_bound(first);
        (start..self.record_count())
            .map(move |position| self.record_at(position))
            .take_while(move |record| record.bin_index <= last)
    }

    /// One statistic of one channel for a bin, if the bin is stored.
    pub fn value_at(&self, bin_index: BinIndex, channel: usize, statistic: Statistic) -> Option<f64> {
        self.find_record(bin_index)?.value(channel, statistic)
    }

    /// Index of a variable, or a configuration error naming the known ones.
    pub(crate) fn require_variable(&self, variable: &str) -> BinningResult<usize> {
        self.header.variable_index(variable).ok_or_else(|| {
            BinningError::Config(format!(
                "unknown variable '{}', product has [{}]",
                variable,
                self.header.variables.join(", ")
            ))
        })
    }
}

/// Lazy iterator over the records of a product.
#[derive(Debug, Clone)]
pub struct RecordIter {
    payload: Bytes,
    num_channels: usize,
    remaining: usize,
}

impl Iterator for RecordIter {
    type Item = BinRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(decode_record(&mut self.payload, self.num_channels))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RecordIter {}
