//! Command-line interface definitions.

pub mod demo;
pub mod output;
pub mod scenarios;
pub mod score;
pub mod stress;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Deserialize;

use nichelord::config::Config;
use nichelord::domain::MetricInputs;
use nichelord::error::{Error, Result};

/// Nichelord - Resilient market-signal scoring and stress testing.
#[derive(Parser, Debug)]
#[command(name = "nichelord")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score an opportunity from a metrics file
    Score(ScoreArgs),

    /// Stress-test an opportunity from a metrics file
    Stress(StressArgs),

    /// List the stress scenarios and their default parameters
    Scenarios,

    /// Exercise the gateway against a simulated flaky upstream
    Demo(DemoArgs),
}

#[derive(clap::Args, Debug)]
pub struct ScoreArgs {
    /// TOML file with the opportunity id and its four metrics.
    pub input: PathBuf,

    /// Emit the scored opportunity as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct StressArgs {
    /// TOML file with the opportunity id and its four metrics.
    pub input: PathBuf,

    /// Override the severity of every scenario (0 to 1).
    #[arg(long)]
    pub severity: Option<Decimal>,

    /// Emit the stress report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct DemoArgs {
    /// Number of fetches to issue.
    #[arg(long, default_value_t = 12)]
    pub rounds: usize,

    /// Cache TTL for fetched values (seconds).
    #[arg(long, default_value_t = 30)]
    pub ttl_secs: u64,
}

impl Cli {
    /// Load the configured (or default) application config.
    pub fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load(path),
            None => Ok(Config::default()),
        }
    }
}

/// A metrics input file: the opportunity id plus its four metrics.
#[derive(Debug, Deserialize)]
pub struct MetricsFile {
    pub id: String,
    pub metrics: MetricInputs,
}

/// Parse a metrics TOML file.
pub fn load_metrics(path: &Path) -> Result<MetricsFile> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(Error::Metrics)
}
