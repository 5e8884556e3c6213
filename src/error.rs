//! Domain errors raised while preparing the dataset and the report

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum EdaError {
    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Columns required by the report are missing: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Label column has an unrecognized value at row {row}: {value}")]
    InvalidLabel { row: usize, value: String },

    #[error("Artifact '{0}' has no data to render")]
    EmptyArtifact(&'static str),

    #[error("Scale factor must be between 1 and 8, got {0}")]
    InvalidScaleFactor(u32),
}
