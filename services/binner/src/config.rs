//! Binner configuration.
//!
//! Loaded from a YAML file with `${VAR}` / `${VAR:-default}` substitution,
//! then overridden by `BINNING_*` / `BINNER_*` environment variables.

use anyhow::{Context, Result};
use bin_store::{Compression, StoreOptions};
use binning::{BinningConfig, PartitionMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level binner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BinnerConfig {
    /// Grid, channels and aggregation rules
    pub binning: BinningConfig,

    /// Output file options
    pub store: StoreOptions,

    /// Whether each input file is one scene or a bag of independent observations
    pub partition_mode: PartitionMode,

    /// Worker threads (default: one per core)
    pub workers: Option<usize>,

    /// Scenes starting before this time are skipped
    pub start_date: Option<DateTime<Utc>>,

    /// Scenes starting after this time are skipped
    pub end_date: Option<DateTime<Utc>>,
}

impl BinnerConfig {
    /// Load from a YAML file, then apply environment overrides.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read binner config from {:?}", path.as_ref()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load binner config from {:?}", path.as_ref()))
    }

    /// Parse YAML content, then apply environment overrides.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: BinnerConfig =
            serde_yaml::from_str(&expanded).with_context(|| "Failed to parse binner config YAML")?;
        Ok(config.with_env_overrides())
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        self.binning = self.binning.with_env_overrides();

        if let Ok(val) = std::env::var("BINNER_PARTITION_MODE") {
            if let Some(mode) = PartitionMode::parse(&val) {
                self.partition_mode = mode;
            }
        }
        if let Ok(val) = std::env::var("BINNER_COMPRESSION") {
            if let Some(compression) = Compression::parse(&val) {
                self.store.compression = compression;
            }
        }
        if let Ok(val) = std::env::var("BINNER_WORKERS") {
            if let Ok(workers) = val.parse() {
                self.workers = Some(workers);
            }
        }
        if let Ok(val) = std::env::var("BINNER_START_DATE") {
            if let Ok(date) = DateTime::parse_from_rfc3339(&val) {
                self.start_date = Some(date.with_timezone(&Utc));
            }
        }
        if let Ok(val) = std::env::var("BINNER_END_DATE") {
            if let Ok(date) = DateTime::parse_from_rfc3339(&val) {
                self.end_date = Some(date.with_timezone(&Utc));
            }
        }
        self
    }

    /// Whether a scene starting at `time` falls inside the configured window.
    pub fn in_time_window(&self, time: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| time >= start) && self.end_date.map_or(true, |end| time <= end)
    }

    /// Check the configuration before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.binning.validate().context("Invalid binning configuration")?;
        if self.workers == Some(0) {
            anyhow::bail!("workers must be at least 1");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                anyhow::bail!("end_date {} is before start_date {}", end.to_rfc3339(), start.to_rfc3339());
            }
        }
        if self.store.compression_level > 9 {
            anyhow::bail!("compression_level must be 0-9, got {}", self.store.compression_level);
        }
        Ok(())
    }
}

/// Substitute `${VAR}` and `${VAR:-default}` references in YAML content.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let reference = &rest[open + 2..];
        let close = reference
            .find('}')
            .with_context(|| format!("Unclosed variable substitution at {:?}", &rest[open..]))?;
        out.push_str(&lookup_var(&reference[..close])?);
        rest = &reference[close + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Value of one reference; an unset or empty variable takes the default.
fn lookup_var(reference: &str) -> Result<String> {
    match reference.split_once(":-") {
        Some((name, fallback)) => Ok(std::env::var(name.trim())
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| fallback.to_string())),
        None => {
            let name = reference.trim();
            std::env::var(name).with_context(|| format!("Environment variable {} not set", name))
        }
    }
}
