//! Gaussian quadrature latitudes.
//!
//! The latitudes of a Gaussian grid with `n` rows are the arcsines of the
//! roots of the Legendre polynomial `P_n`. They are computed once per row
//! count with Newton iteration and shared through a process-wide cache.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, RwLock};

const NEWTON_EPSILON: f64 = 1e-15;
const NEWTON_MAX_ITERATIONS: usize = 100;

/// Cache of computed latitude tables, keyed by row count.
static LATITUDE_CACHE: Lazy<RwLock<HashMap<usize, Arc<[f64]>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gaussian latitudes in degrees for a grid of `num_rows` rows, ordered
/// north to south. `num_rows` must be even and non-zero.
pub fn gaussian_latitudes(num_rows: usize) -> Arc<[f64]> {
    {
        let cache = LATITUDE_CACHE.read().unwrap_or_else(|e| e.into_inner());
        if let Some(lats) = cache.get(&num_rows) {
            return lats.clone();
        }
    }

    let lats: Arc<[f64]> = compute_gaussian_latitudes(num_rows).into();

    let mut cache = LATITUDE_CACHE.write().unwrap_or_else(|e| e.into_inner());
    cache.entry(num_rows).or_insert(lats).clone()
}

/// Compute the latitude table without touching the cache.
pub fn compute_gaussian_latitudes(num_rows: usize) -> Vec<f64> {
    let n = num_rows;
    let half = n / 2;
    let mut lats = vec![0.0; n];

    for i in 0..half {
        let root = legendre_root(n, i);
        let lat = root.asin().to_degrees();
        lats[i] = lat;
        lats[n - 1 - i] = -lat;
    }

    lats
}

/// The `i`-th largest root of `P_n` (0-based), refined from the Tricomi guess.
fn legendre_root(n: usize, i: usize) -> f64 {
    let nf = n as f64;
    let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();

    for _ in 0..NEWTON_MAX_ITERATIONS {
        let (p, dp) = legendre_with_derivative(n, z);
        let z_prev = z;
        z = z_prev - p / dp;
        if (z - z_prev).abs() < NEWTON_EPSILON {
            break;
        }
    }

    z
}

/// Evaluate `P_n(z)` and its derivative by the three-term recurrence.
fn legendre_with_derivative(n: usize, z: f64) -> (f64, f64) {
    let mut p1 = 1.0;
    let mut p2 = 0.0;

    for j in 1..=n {
        let jf = j as f64;
        let p3 = p2;
        p2 = p1;
        p1 = ((2.0 * jf - 1.0) * z * p2 - (jf - 1.0) * p3) / jf;
    }

    let dp = n as f64 * (z * p1 - p2) / (z * z - 1.0);
    (p1, dp)
}
