//! Benchmarks for position to bin index resolution.
//!
//! Run with: cargo bench --package planetary-grid --bench resolver_benchmarks

use binning_common::GridSpec;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use planetary_grid::{find_closest_in_array, BinIndexResolver};
use rand::Rng;

/// Random positions spread over the globe.
fn random_positions(count: usize) -> Vec<(f64, f64)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| (rng.gen_range(-90.0..=90.0), rng.gen_range(-180.0..180.0)))
        .collect()
}

fn bench_bin_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("bin_index");
    let positions = random_positions(10_000);
    group.throughput(Throughput::Elements(positions.len() as u64));

    for (name, spec) in [
        ("reduced_gaussian_64", GridSpec::reduced_gaussian(64)),
        ("regular_gaussian_64", GridSpec::regular_gaussian(64)),
        ("sinusoidal_2160", GridSpec::sinusoidal(2160)),
        ("plate_carree_4320", GridSpec::plate_carree(4320)),
    ] {
        let resolver = BinIndexResolver::for_spec(spec).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &positions, |b, positions| {
            b.iter(|| {
                for &(lat, lon) in positions {
                    black_box(resolver.bin_index(lat, lon).unwrap());
                }
            })
        });
    }

    group.finish();
}

fn bench_center_lat_lon(c: &mut Criterion) {
    let resolver = BinIndexResolver::for_spec(GridSpec::sinusoidal(2160)).unwrap();
    let num_bins = resolver.num_bins();
    let mut rng = rand::thread_rng();
    let bins: Vec<u64> = (0..10_000).map(|_| rng.gen_range(0..num_bins)).collect();

    let mut group = c.benchmark_group("center_lat_lon");
    group.throughput(Throughput::Elements(bins.len() as u64));
    group.bench_function("sinusoidal_2160", |b| {
        b.iter(|| {
            for &bin in &bins {
                black_box(resolver.center_lat_lon(bin).unwrap());
            }
        })
    });
    group.finish();
}

fn bench_find_closest(c: &mut Criterion) {
    let table: Vec<f64> = (0..4320).map(|i| -90.0 + (i as f64 + 0.5) * 180.0 / 4320.0).collect();
    c.bench_function("find_closest_in_array_4320", |b| {
        b.iter(|| find_closest_in_array(black_box(&table), black_box(12.345)))
    });
}

criterion_group!(benches, bench_bin_index, bench_center_lat_lon, bench_find_closest);
criterion_main!(benches);
