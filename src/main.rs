//! churn-eda: renders the exploratory analysis charts for a churn dataset
//!
//! Usage: churn-eda --input=<input> --out_dir=<out_dir>

use anyhow::Result;
use churn_eda::{Args, ReportGenerator};
use clap::Parser;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber, honoring `RUST_LOG` when set
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level());

    let generator = ReportGenerator::new(args.report_config()?);

    let start_time = Instant::now();
    let written = generator.run(&args.input, &args.out_dir)?;
    info!(
        artifacts = written.len(),
        "Report finished in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    println!("EDA reports successfully stored in: {}", args.out_dir.display());

    Ok(())
}
