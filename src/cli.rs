//! Command-line interface definitions and argument parsing

use crate::report::{ReportConfig, DEFAULT_SCALE_FACTOR};
use clap::Parser;
use std::path::PathBuf;

/// Exploratory data analysis report for customer churn data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path (including filename) to the cleaned data CSV file
    #[arg(long)]
    pub input: PathBuf,

    /// Directory where the figures are saved
    #[arg(long = "out_dir", visible_alias = "out-dir")]
    pub out_dir: PathBuf,

    /// Multiplier applied to image dimensions and font sizes
    #[arg(long, default_value_t = DEFAULT_SCALE_FACTOR)]
    pub scale_factor: u32,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validate rendering options and build the report configuration
    pub fn report_config(&self) -> crate::Result<ReportConfig> {
        ReportConfig::new(self.scale_factor)
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
