//! Geographic bounding boxes used to restrict binning to a region.

use crate::observation::normalize_lon;
use serde::{Deserialize, Serialize};

/// A geographic bounding box in degrees.
///
/// A box whose `min_lon` is greater than its `max_lon` crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Whole-globe box.
    pub fn global() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Parse "minlon,minlat,maxlon,maxlat".
    pub fn parse(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let num = |p: &str| -> Result<f64, BboxParseError> {
            p.parse()
                .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
        };

        let bbox = Self::new(num(parts[0])?, num(parts[1])?, num(parts[2])?, num(parts[3])?);
        if bbox.min_lat > bbox.max_lat {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }
        Ok(bbox)
    }

    /// Whether the box wraps across the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    /// Check if a point is inside the box. Longitudes are compared after
    /// normalization, so 190 and -170 are the same meridian.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.min_lat || lat > self.max_lat {
            return false;
        }
        if self.max_lon - self.min_lon >= 360.0 {
            return true;
        }

        let lon = normalize_lon(lon);
        let min = normalize_lon(self.min_lon);
        let max = if self.max_lon >= 180.0 { 180.0 } else { normalize_lon(self.max_lon) };

        if min <= max {
            lon >= min && lon <= max
        } else {
            lon >= min || lon <= max
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::global()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bounding box format: {0}. Expected 'minlon,minlat,maxlon,maxlat'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox::parse("-125.0, 24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.min_lon, -125.0);
        assert_eq!(bbox.min_lat, 24.0);
        assert_eq!(bbox.max_lon, -66.0);
        assert_eq!(bbox.max_lat, 50.0);

        assert!(BoundingBox::parse("1,2,3").is_err());
        assert!(BoundingBox::parse("0,50,10,40").is_err());
        assert!(matches!(
            BoundingBox::parse("a,0,1,1"),
            Err(BboxParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_contains() {
        let bbox = BoundingBox::new(-10.0, -5.0, 10.0, 5.0);
        assert!(bbox.contains(0.0, 0.0));
        assert!(bbox.contains(5.0, 10.0));
        assert!(!bbox.contains(6.0, 0.0));
        assert!(!bbox.contains(0.0, 11.0));
        assert!(bbox.contains(0.0, 360.0));
    }

    #[test]
    fn test_contains_across_antimeridian() {
        let pacific = BoundingBox::new(160.0, -50.0, -140.0, 50.0);
        assert!(pacific.crosses_antimeridian());
        assert!(pacific.contains(0.0, 170.0));
        assert!(pacific.contains(0.0, -150.0));
        assert!(pacific.contains(0.0, 190.0));
        assert!(!pacific.contains(0.0, 0.0));
    }

    #[test]
    fn test_global_contains_everything() {
        let global = BoundingBox::global();
        assert!(global.contains(90.0, 179.99));
        assert!(global.contains(-90.0, -180.0));
        assert!(global.contains(0.0, 180.0));
    }
}
