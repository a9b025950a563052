use std::path::{Path, PathBuf};
use clap::Parser;

use crate::config::constants::{DEFAULT_SEED, DEFAULT_TARGET_STATIONS};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find an area with a given number of base stations", long_about = None)]
pub struct Args {
    #[arg(short = 'b', long, default_value_t = DEFAULT_TARGET_STATIONS, help = "Number of base stations the area must contain")]
    base_stations: usize,

    #[arg(short, long, default_value_t = DEFAULT_SEED, help = "Seed for random number generator")]
    seed: u64,

    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["MIN", "MAX"],
        help = "Minimum and maximum density of base stations per square kilometer"
    )]
    density: Option<Vec<f64>>,

    #[arg(long, help = "Path to the positions.jsonl dataset")]
    dataset: Option<PathBuf>,

    #[arg(long, help = "ns-3 checkout containing contrib/defiance/utils/data/positions.jsonl")]
    ns3_home: Option<PathBuf>,

    #[arg(long, help = "JSON config file")]
    config: Option<PathBuf>,

    #[arg(long)]
    max_attempts: Option<usize>,

    #[arg(long)]
    timeout_secs: Option<f64>,

    #[arg(long, num_args = 1.., help = "Run one search per seed instead of a single search")]
    batch_seeds: Vec<u64>,

    #[arg(long, default_value_t = false)]
    parallel: bool,

    #[arg(long, help = "Write the stations of the found area to this CSV file")]
    export_stations: Option<PathBuf>,

    #[arg(long, help = "Write batch results to this CSV file")]
    export_results: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Print results as JSON")]
    json: bool,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,
}

impl Args {
    pub fn base_stations(&self) -> usize {
        self.base_stations
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `(min, max)` if given on the command line.
    pub fn density(&self) -> Option<(f64, f64)> {
        match self.density.as_deref() {
            Some([min, max]) => Some((*min, *max)),
            _ => None,
        }
    }

    pub fn dataset(&self) -> Option<&Path> {
        self.dataset.as_deref()
    }

    pub fn ns3_home(&self) -> Option<&Path> {
        self.ns3_home.as_deref()
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }

    pub fn timeout_secs(&self) -> Option<f64> {
        self.timeout_secs
    }

    pub fn batch_seeds(&self) -> &[u64] {
        &self.batch_seeds
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn export_stations(&self) -> Option<&Path> {
        self.export_stations.as_deref()
    }

    pub fn export_results(&self) -> Option<&Path> {
        self.export_results.as_deref()
    }

    pub fn json(&self) -> bool {
        self.json
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }
}
