//! churn-eda: exploratory data analysis report for customer churn records
//!
//! Loads a churn CSV with Polars, normalizes the `Churn` label, renames columns
//! to display names and renders a fixed set of charts and one summary table as
//! PNG images with Plotters.

pub mod cli;
pub mod data;
pub mod error;
pub mod report;
pub mod summary;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{Dataset, COLUMN_RENAMES, LABEL_COLUMN};
pub use error::EdaError;
pub use report::{Artifact, ReportConfig, ReportGenerator};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
