//! Synthetic Level-2 data generators.
//!
//! Everything here is deterministic for a given seed so that tests can
//! compare partitioned and sequential runs exactly.

use binning_common::Observation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates swath-like observation tracks.
///
/// A swath is a band of `width` pixels across track and `length` scan lines
/// along track, starting at `(start_lat, start_lon)` and moving south-north
/// with a small eastward drift, like a descending-node ocean colour pass.
#[derive(Debug, Clone)]
pub struct SwathGenerator {
    pub start_lat: f64,
    pub start_lon: f64,
    pub width: usize,
    pub length: usize,
    /// Pixel spacing in degrees.
    pub spacing: f64,
    pub num_channels: usize,
    pub seed: u64,
}

impl Default for SwathGenerator {
    fn default() -> Self {
        Self {
            start_lat: -60.0,
            start_lon: -30.0,
            width: 20,
            length: 50,
            spacing: 0.5,
            num_channels: 1,
            seed: 42,
        }
    }
}

impl SwathGenerator {
    /// Generate the observations of one swath.
    ///
    /// Channel `k` carries `sea_surface_value(lat, lon) + k` plus a little
    /// deterministic noise.
    pub fn generate(&self) -> Vec<Observation> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = Vec::with_capacity(self.width * self.length);

        for line in 0..self.length {
            let lat = (self.start_lat + line as f64 * self.spacing).clamp(-89.9, 89.9);
            let drift = line as f64 * self.spacing * 0.1;
            for pixel in 0..self.width {
                let lon = self.start_lon + drift + pixel as f64 * self.spacing;
                let base = sea_surface_value(lat, lon);
                let values = (0..self.num_channels)
                    .map(|k| base + k as f64 + rng.gen_range(-0.05..0.05))
                    .collect();
                out.push(Observation::new(lat, lon, values));
            }
        }
        out
    }

    /// Generate `count` swaths, each shifted east and reseeded.
    pub fn generate_scenes(&self, count: usize) -> Vec<Vec<Observation>> {
        (0..count)
            .map(|i| {
                let scene = SwathGenerator {
                    start_lon: self.start_lon + i as f64 * 7.5,
                    seed: self.seed.wrapping_add(i as u64 + 1),
                    ..self.clone()
                };
                scene.generate()
            })
            .collect()
    }
}

/// A smooth, temperature-like field in the 270-305 range.
pub fn sea_surface_value(lat: f64, lon: f64) -> f64 {
    let lat_rad = lat.to_radians();
    287.5 + 17.5 * lat_rad.cos() * lat_rad.cos() - 2.5 + 1.5 * (lon.to_radians() * 3.0).sin()
}

/// Uniformly scattered single-channel observations over the globe.
pub fn random_observations(count: usize, seed: u64) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let lat = rng.gen_range(-90.0..90.0);
            let lon = rng.gen_range(-180.0..180.0);
            Observation::new(lat, lon, vec![sea_surface_value(lat, lon)])
        })
        .collect()
}

/// Split observations into `n` round-robin partitions.
pub fn split_round_robin(observations: &[Observation], n: usize) -> Vec<Vec<Observation>> {
    let n = n.max(1);
    let mut parts = vec![Vec::new(); n];
    for (i, obs) in observations.iter().enumerate() {
        parts[i % n].push(obs.clone());
    }
    parts
}
