//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use bin_store::BinnedProduct;
use binning::{bin_partitions, CancelToken, Statistic};
use planetary_grid::BinIndexResolver;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::BinnerConfig;
use crate::input::{read_observations, InputFile};

/// Summary of a `bin` run, printed as JSON.
#[derive(Debug, Serialize)]
pub struct BinSummary {
    pub output: PathBuf,
    pub inputs: usize,
    /// Inputs whose scene time fell outside the configured window.
    pub skipped_scenes: usize,
    pub malformed_lines: usize,
    pub accepted: u64,
    pub rejected: u64,
    pub outside_region: u64,
    pub records: u64,
    pub elapsed_ms: u128,
}

/// Bin every input file into one product.
pub fn run_bin(config: &BinnerConfig, inputs: &[PathBuf], output: &Path, cancel: &CancelToken) -> Result<BinSummary> {
    let start = Instant::now();
    config.validate()?;

    let files: Vec<InputFile> = inputs
        .par_iter()
        .map(read_observations)
        .collect::<Result<_>>()?;
    let malformed_lines = files.iter().map(|f| f.malformed).sum();

    let mut skipped_scenes = 0;
    let mut partitions = Vec::with_capacity(files.len());
    for (path, file) in inputs.iter().zip(files) {
        match file.scene_time {
            Some(time) if !config.in_time_window(time) => {
                info!(input = %path.display(), scene_time = %time, "Skipping scene outside time window");
                skipped_scenes += 1;
            }
            None if config.start_date.is_some() || config.end_date.is_some() => {
                warn!(input = %path.display(), "Scene time unknown, binning it regardless of time window");
                partitions.push(file.observations);
            }
            _ => partitions.push(file.observations),
        }
    }

    let resolver = Arc::new(
        BinIndexResolver::for_spec(config.binning.grid)
            .with_context(|| format!("Failed to build grid {}", config.binning.grid))?,
    );
    info!(
        grid = %config.binning.grid,
        num_bins = resolver.num_bins(),
        inputs = inputs.len(),
        mode = ?config.partition_mode,
        "Binning observations"
    );

    let (engine, report) = bin_partitions(
        Arc::clone(&resolver),
        Arc::new(config.binning.clone()),
        partitions,
        config.partition_mode,
        cancel,
    )?;
    if report.cancelled {
        warn!("Binning was cancelled, writing partial product");
    }

    let observations = engine.observations();
    let records = engine.finalize_all()?;

    let options = bin_store::StoreOptions {
        observation_count: observations,
        ..config.store.clone()
    };
    let header = bin_store::write(output, resolver.grid().as_ref(), &config.binning.variables, &records, &options)
        .with_context(|| format!("Failed to write product {:?}", output))?;

    Ok(BinSummary {
        output: output.to_path_buf(),
        inputs: inputs.len(),
        skipped_scenes,
        malformed_lines,
        accepted: report.accepted,
        rejected: report.rejected,
        outside_region: report.outside_region,
        records: header.record_count,
        elapsed_ms: start.elapsed().as_millis(),
    })
}

/// Header and per-variable statistics of a product.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub header: bin_store::ProductHeader,
    pub variables: Vec<VariableSummary>,
}

#[derive(Debug, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub bins_with_data: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Describe a product; `sample` records are also returned for printing.
pub fn run_inspect(path: &Path, sample: usize) -> Result<(InspectReport, Vec<binning::BinRecord>)> {
    let product = BinnedProduct::open(path).with_context(|| format!("Failed to open product {:?}", path))?;

    let mut variables: Vec<VariableSummary> = product
        .variables()
        .iter()
        .map(|name| VariableSummary {
            name: name.clone(),
            bins_with_data: 0,
            min: None,
            max: None,
        })
        .collect();

    for record in product.read_records() {
        for (summary, channel) in variables.iter_mut().zip(&record.channels) {
            if channel.count == 0 {
                continue;
            }
            summary.bins_with_data += 1;
            let mean = channel.get(Statistic::Mean);
            summary.min = Some(summary.min.map_or(mean, |m| m.min(mean)));
            summary.max = Some(summary.max.map_or(mean, |m| m.max(mean)));
        }
    }

    let samples = product.read_records().take(sample).collect();
    Ok((
        InspectReport {
            header: product.header().clone(),
            variables,
        },
        samples,
    ))
}
