//! Grid specifications for global binning grids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row/column layout family of a global binning grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    /// Gaussian latitudes, column count shrinking toward the poles (ECMWF table).
    ReducedGaussian,
    /// Gaussian latitudes, constant column count.
    RegularGaussian,
    /// Equally spaced latitudes, constant column count.
    PlateCarree,
    /// SeaWiFS integerized sinusoidal equal-area grid.
    Sinusoidal,
}

impl GridKind {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "reduced_gaussian" | "reduced" => Some(Self::ReducedGaussian),
            "regular_gaussian" | "gaussian" => Some(Self::RegularGaussian),
            "plate_carree" | "platecarree" | "equirectangular" => Some(Self::PlateCarree),
            "sinusoidal" | "sea" | "isin" => Some(Self::Sinusoidal),
            _ => None,
        }
    }

    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReducedGaussian => "reduced_gaussian",
            Self::RegularGaussian => "regular_gaussian",
            Self::PlateCarree => "plate_carree",
            Self::Sinusoidal => "sinusoidal",
        }
    }

    /// Whether row latitudes are Gaussian quadrature latitudes.
    pub fn is_gaussian(&self) -> bool {
        matches!(self, Self::ReducedGaussian | Self::RegularGaussian)
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Specification of a global binning grid.
///
/// `num_rows` is the resolution parameter: a Gaussian grid with 64 rows has
/// 32 Gaussian latitudes per hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSpec {
    pub kind: GridKind,
    pub num_rows: usize,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(kind: GridKind, num_rows: usize) -> Self {
        Self { kind, num_rows }
    }

    pub fn reduced_gaussian(num_rows: usize) -> Self {
        Self::new(GridKind::ReducedGaussian, num_rows)
    }

    pub fn regular_gaussian(num_rows: usize) -> Self {
        Self::new(GridKind::RegularGaussian, num_rows)
    }

    pub fn plate_carree(num_rows: usize) -> Self {
        Self::new(GridKind::PlateCarree, num_rows)
    }

    pub fn sinusoidal(num_rows: usize) -> Self {
        Self::new(GridKind::Sinusoidal, num_rows)
    }

    /// Number of Gaussian latitudes per hemisphere (N in N32, N80, ...).
    pub fn gaussian_number(&self) -> usize {
        self.num_rows / 2
    }

    /// Nominal latitudinal row height in degrees.
    pub fn row_height_deg(&self) -> f64 {
        180.0 / self.num_rows as f64
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        // SeaWiFS 9 km standard binning grid
        Self::sinusoidal(2160)
    }
}

impl fmt::Display for GridSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} rows)", self.kind, self.num_rows)
    }
}
