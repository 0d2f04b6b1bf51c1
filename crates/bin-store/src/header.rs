//! Product header and write options.

use binning_common::{BinIndex, GridSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File magic.
pub const MAGIC: &[u8; 4] = b"L3BN";

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// Payload compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    None,
    #[default]
    Zlib,
}

impl Compression {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "raw" => Some(Self::None),
            "zlib" | "deflate" => Some(Self::Zlib),
            _ => None,
        }
    }
}

/// Options for writing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub compression: Compression,
    /// zlib level, 0-9.
    pub compression_level: u32,
    /// Total observations that went into the product, recorded in the header.
    pub observation_count: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Zlib,
            compression_level: 6,
            observation_count: 0,
        }
    }
}

/// JSON header describing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductHeader {
    pub grid: GridSpec,
    pub num_rows: usize,
    pub num_bins: BinIndex,
    pub variables: Vec<String>,
    pub record_count: u64,
    pub compression: Compression,
    pub created: DateTime<Utc>,
    pub observation_count: u64,
}

impl ProductHeader {
    /// Index of a variable by name.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_json_round_trip() {
        let header = ProductHeader {
            grid: GridSpec::sinusoidal(2160),
            num_rows: 2160,
            num_bins: 5_940_422,
            variables: vec!["chlor_a".into(), "Rrs_443".into()],
            record_count: 12,
            compression: Compression::Zlib,
            created: Utc::now(),
            observation_count: 99,
        };
        let json = serde_json::to_string(&header).unwrap();
        assert!(json.contains("\"compression\":\"zlib\""));
        let parsed: ProductHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.variable_index("Rrs_443"), Some(1));
        assert_eq!(parsed.variable_index("sst"), None);
    }

    #[test]
    fn test_compression_parse() {
        assert_eq!(Compression::parse("ZLIB"), Some(Compression::Zlib));
        assert_eq!(Compression::parse("none"), Some(Compression::None));
        assert_eq!(Compression::parse("lz4"), None);
    }
}
