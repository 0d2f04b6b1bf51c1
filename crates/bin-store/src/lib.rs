//! Storage for finalized Level-3 binned products.
//!
//! A product file (`.l3b`) holds the grid description, the channel names and
//! the finalized bin records sorted by bin index. Only non-empty bins are
//! stored.
//!
//! # File layout
//!
//! All integers are little-endian.
//!
//! ```text
//! "L3BN"            magic
//! u32               format version (1)
//! u32               header length
//! [u8]              header JSON (ProductHeader)
//! u64               payload length
//! [u8]              payload: fixed-size records, zlib-compressed if the
//!                   header says so
//! u32               CRC-32 of the stored payload bytes
//! ```
//!
//! Each record is `bin_index u64, num_obs u64, num_scenes u64,
//! center_lat f64, center_lon f64`, followed per channel by
//! `count u64, mean, variance, min, max, weighted_mean, weight` (f64).
//!
//! # Example
//!
//! ```no_run
//! use bin_store::{BinnedProduct, StoreOptions};
//! use binning::Statistic;
//!
//! # fn run(records: Vec<binning::BinRecord>) -> binning_common::BinningResult<()> {
//! let grid = planetary_grid::build_grid(binning_common::GridSpec::sinusoidal(2160))?;
//! bin_store::write("chl.l3b", grid.as_ref(), &["chlor_a".to_string()], &records, &StoreOptions::default())?;
//!
//! let product = BinnedProduct::open("chl.l3b")?;
//! let _raster = product.to_raster("chlor_a", Statistic::Mean, f64::NAN)?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod codec;
pub mod header;
pub mod raster;
pub mod reader;
pub mod writer;

pub use classify::is_binned_product_name;
pub use header::{Compression, ProductHeader, StoreOptions, FORMAT_VERSION, MAGIC};
pub use raster::{BinRaster, PlateCarreeRaster};
pub use reader::{BinnedProduct, RecordIter};
pub use writer::{to_bytes, write};
