//! Level-2 to Level-3 binner.
//!
//! Bins JSON-lines observation files onto a global grid and writes a binned
//! product, or inspects an existing product.

mod commands;
mod config;
mod input;

use std::path::PathBuf;

use anyhow::Result;
use bin_store::is_binned_product_name;
use binning::CancelToken;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::BinnerConfig;

#[derive(Parser, Debug)]
#[command(name = "binner")]
#[command(about = "Spatial binning of Level-2 observations into Level-3 products")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bin observation files into a product
    Bin {
        /// Configuration file path (defaults plus BINNING_* env when omitted)
        #[arg(short, long, env = "BINNER_CONFIG")]
        config: Option<PathBuf>,

        /// Output product path
        #[arg(short, long)]
        output: PathBuf,

        /// Worker threads (overrides the config file)
        #[arg(short, long)]
        workers: Option<usize>,

        /// JSON-lines observation files, one partition each
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print a product's header and per-variable summary
    Inspect {
        /// Product path
        path: PathBuf,

        /// Also print the first N records
        #[arg(long, default_value_t = 0)]
        records: usize,
    },
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Command::Bin {
            config,
            output,
            workers,
            inputs,
        } => {
            let mut config = match config {
                Some(path) => BinnerConfig::from_yaml(&path)?,
                None => BinnerConfig::from_env(),
            };
            if workers.is_some() {
                config.workers = workers;
            }

            if let Some(threads) = config.workers {
                rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()?;
            }

            let name = output.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            if !is_binned_product_name(&name) {
                warn!(output = %output.display(), "Output name does not follow binned product naming");
            }

            info!(inputs = inputs.len(), output = %output.display(), "Starting binner");
            let summary = commands::run_bin(&config, &inputs, &output, &CancelToken::new())?;
            info!(records = summary.records, elapsed_ms = summary.elapsed_ms as u64, "Binning completed");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Inspect { path, records } => {
            let (report, samples) = commands::run_inspect(&path, records)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            for record in samples {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
    }

    Ok(())
}
