//! Level-2 observations fed into the binner.

use serde::{Deserialize, Serialize};

/// One geolocated swath pixel with its measured channel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub lat: f64,
    pub lon: f64,
    pub values: Vec<f64>,
}

impl Observation {
    pub fn new(lat: f64, lon: f64, values: Vec<f64>) -> Self {
        Self { lat, lon, values }
    }

    /// Whether the position itself can be binned (finite, latitude within the poles).
    pub fn has_valid_position(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && (-90.0..=90.0).contains(&self.lat)
    }
}

/// Normalize a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
