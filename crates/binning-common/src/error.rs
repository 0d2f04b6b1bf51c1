//! Error types for the binning workspace.

use thiserror::Error;

use crate::BinIndex;

/// Result type alias using BinningError.
pub type BinningResult<T> = Result<T, BinningError>;

/// Primary error type for grid, aggregation and store operations.
#[derive(Debug, Error)]
pub enum BinningError {
    // === Per-observation errors (recoverable: skip and continue) ===
    #[error("Invalid observation: {reason}")]
    InvalidObservation { reason: String },

    // === Programming errors ===
    #[error("{what} {value} out of range (limit {limit})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        limit: i64,
    },

    #[error("Unsupported grid: {0}")]
    UnsupportedGrid(String),

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    // === Batch errors ===
    #[error(
        "Accumulator table full: bin {bin_index} would exceed {max_bins} bins after {observations} observations (scene offset {scene_offset})"
    )]
    ResourceExhausted {
        bin_index: BinIndex,
        max_bins: usize,
        /// Observations committed to the engine.
        observations: u64,
        /// Position within the scene of the observation that overflowed; every
        /// earlier observation of the scene was discarded. Zero outside scenes.
        scene_offset: u64,
    },

    // === Store errors ===
    #[error("Records not ascending at position {position}: bin {bin_index} follows bin {previous}")]
    OrderingViolation {
        position: usize,
        previous: BinIndex,
        bin_index: BinIndex,
    },

    #[error("Invalid product format: {0}")]
    InvalidFormat(String),

    #[error("Payload checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BinningError {
    /// Create an InvalidObservation error.
    pub fn invalid_observation(reason: impl Into<String>) -> Self {
        Self::InvalidObservation {
            reason: reason.into(),
        }
    }

    /// Create an OutOfRange error for an index checked against an exclusive limit.
    pub fn out_of_range(what: &'static str, value: impl Into<i64>, limit: impl Into<i64>) -> Self {
        Self::OutOfRange {
            what,
            value: value.into(),
            limit: limit.into(),
        }
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Whether the caller can skip the offending item (or flush) and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BinningError::InvalidObservation { .. } | BinningError::ResourceExhausted { .. }
        )
    }
}

impl From<serde_json::Error> for BinningError {
    fn from(err: serde_json::Error) -> Self {
        BinningError::InvalidFormat(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(BinningError::invalid_observation("lat 91").is_recoverable());
        assert!(BinningError::ResourceExhausted {
            bin_index: 3,
            max_bins: 2,
            observations: 10,
            scene_offset: 0,
        }
        .is_recoverable());
        assert!(!BinningError::out_of_range("row", 64, 64).is_recoverable());
        assert!(!BinningError::OrderingViolation {
            position: 1,
            previous: 5,
            bin_index: 4
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = BinningError::OrderingViolation {
            position: 7,
            previous: 12,
            bin_index: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains("position 7"));
        assert!(msg.contains("bin 9"));
        assert!(msg.contains("bin 12"));

        let err = BinningError::out_of_range("row", 70, 64);
        assert_eq!(err.to_string(), "row 70 out of range (limit 64)");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BinningError = io.into();
        assert!(matches!(err, BinningError::Io(_)));
    }
}
