//! Report orchestration: load, prepare, summarize, validate and render

use crate::data::{Dataset, LABEL_COLUMN};
use crate::error::EdaError;
use crate::summary::{
    self, CategoricalSummary, CategoryCounts, ClassBalance, CorrelationMatrix, Histogram,
};
use crate::viz;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Numeric features shown as histograms
pub const NUMERIC_FEATURES: [&str; 3] = ["Tenure", "Monthly Charges", "Total Charges"];

/// Low-cardinality features shown as stacked bars
pub const CHURN_DISTRIBUTION_FEATURES: [&str; 3] = ["Senior Citizen", "Partner", "Dependents"];

/// Features shown in the category count grid
pub const CROSS_COUNT_FEATURES: [&str; 12] = [
    "Contract",
    "Internet Service",
    "Multiple Lines",
    "Online Security",
    "Online Backup",
    "Device Protection",
    "Streaming Movies",
    "Streaming TV",
    "Phone Service",
    "Tech Support",
    "Paperless Billing",
    "Payment Method",
];

/// Panels per row in the category count grid
const CROSS_COUNT_COLUMNS: usize = 3;

pub const DEFAULT_SCALE_FACTOR: u32 = 3;
pub const MAX_SCALE_FACTOR: u32 = 8;

/// Rendering options for the report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportConfig {
    /// Multiplier applied to every pixel dimension and font size
    pub scale_factor: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
        }
    }
}

impl ReportConfig {
    pub fn new(scale_factor: u32) -> crate::Result<Self> {
        if !(1..=MAX_SCALE_FACTOR).contains(&scale_factor) {
            return Err(EdaError::InvalidScaleFactor(scale_factor).into());
        }
        Ok(Self { scale_factor })
    }
}

/// One image written by the report
#[derive(Debug, Clone)]
pub enum Artifact {
    CategoricalTable(CategoricalSummary),
    ClassImbalance(ClassBalance),
    NumericDistribution(Vec<Histogram>),
    NumericCorrelation(CorrelationMatrix),
    CategoryChurnDistribution(Vec<CategoryCounts>),
    CategoryCrossCounts(Vec<CategoryCounts>),
}

impl Artifact {
    /// Fixed file name inside the output directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::CategoricalTable(_) => "table_1_cat_unique_values.png",
            Artifact::ClassImbalance(_) => "figure_1_class_imbalance.png",
            Artifact::NumericDistribution(_) => "figure_2_numeric_feat_dist.png",
            Artifact::NumericCorrelation(_) => "figure_3_numeric_feat_corr.png",
            Artifact::CategoryChurnDistribution(_) => "figure_4_cat_feat_churn_dist.png",
            Artifact::CategoryCrossCounts(_) => "figure_5_cat_feat_2dhist.png",
        }
    }

    /// Reject artifacts missing the panels or rows their figure is built from.
    ///
    /// A panel whose feature has no values at all is still drawn, empty.
    pub fn validate(&self) -> crate::Result<()> {
        let complete = match self {
            Artifact::CategoricalTable(table) => !table.rows.is_empty(),
            Artifact::ClassImbalance(balance) => !balance.counts.is_empty(),
            Artifact::NumericDistribution(histograms) => histograms.len() == NUMERIC_FEATURES.len(),
            Artifact::NumericCorrelation(matrix) => {
                let n = matrix.columns.len();
                matrix.values.shape() == [n, n]
            }
            Artifact::CategoryChurnDistribution(panels) => {
                panels.len() == CHURN_DISTRIBUTION_FEATURES.len()
            }
            Artifact::CategoryCrossCounts(panels) => panels.len() == CROSS_COUNT_FEATURES.len(),
        };

        if !complete {
            return Err(EdaError::EmptyArtifact(self.file_name()).into());
        }
        Ok(())
    }

    pub fn render(&self, output_path: &Path, scale: u32) -> crate::Result<()> {
        match self {
            Artifact::CategoricalTable(table) => {
                viz::render_categorical_table(table, output_path, scale)
            }
            Artifact::ClassImbalance(balance) => {
                viz::render_class_imbalance(balance, output_path, scale)
            }
            Artifact::NumericDistribution(histograms) => {
                viz::render_numeric_distributions(histograms, output_path, scale)
            }
            Artifact::NumericCorrelation(matrix) => {
                viz::render_correlation_heatmap(matrix, output_path, scale)
            }
            Artifact::CategoryChurnDistribution(panels) => {
                viz::render_category_distribution(panels, output_path, scale)
            }
            Artifact::CategoryCrossCounts(panels) => {
                viz::render_category_grid(panels, output_path, CROSS_COUNT_COLUMNS, scale)
            }
        }
    }
}

/// Every column the charts read, by display name
pub fn required_columns() -> Vec<&'static str> {
    NUMERIC_FEATURES
        .iter()
        .chain(CHURN_DISTRIBUTION_FEATURES.iter())
        .chain(CROSS_COUNT_FEATURES.iter())
        .copied()
        .chain(std::iter::once(LABEL_COLUMN))
        .collect()
}

/// Apply label normalization and display renaming, then check chart columns
pub fn prepare_dataset(dataset: &mut Dataset) -> crate::Result<()> {
    dataset.normalize_label()?;
    dataset.rename_columns()?;
    dataset.require_columns(&required_columns())
}

/// Compute every artifact from a prepared dataset, in report order
pub fn build_artifacts(dataset: &Dataset) -> crate::Result<Vec<Artifact>> {
    let labels = dataset.labels()?;

    debug!("Computing class balance");
    let balance = summary::class_balance(&labels);

    debug!("Computing numeric feature histograms");
    let histograms = NUMERIC_FEATURES
        .iter()
        .map(|feature| -> crate::Result<Histogram> {
            let values = dataset.numeric_values(feature)?;
            Ok(summary::histogram(feature, &values, &labels, summary::MAX_BINS))
        })
        .collect::<crate::Result<Vec<_>>>()?;

    debug!("Computing numeric feature correlation");
    let correlation = summary::correlation_matrix(dataset)?;

    debug!("Counting categorical features by label");
    let churn_distribution =
        summary::category_panels(dataset, &CHURN_DISTRIBUTION_FEATURES, &labels)?;
    let cross_counts = summary::category_panels(dataset, &CROSS_COUNT_FEATURES, &labels)?;

    debug!("Summarizing categorical features");
    let table = summary::categorical_summary(dataset)?;

    Ok(vec![
        Artifact::CategoricalTable(table),
        Artifact::ClassImbalance(balance),
        Artifact::NumericDistribution(histograms),
        Artifact::NumericCorrelation(correlation),
        Artifact::CategoryChurnDistribution(churn_distribution),
        Artifact::CategoryCrossCounts(cross_counts),
    ])
}

/// Builds the exploratory report for one churn dataset
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Run the full report
    ///
    /// # Arguments
    /// * `input_path` - CSV file with the churn records
    /// * `out_dir` - Directory receiving the images, created if absent
    ///
    /// # Returns
    /// * Paths of the written images, in report order
    pub fn run(
        &self,
        input_path: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
    ) -> crate::Result<Vec<PathBuf>> {
        let input_path = input_path.as_ref();
        let out_dir = out_dir.as_ref();

        if !out_dir.exists() {
            fs::create_dir_all(out_dir).with_context(|| {
                format!("Failed to create output directory {}", out_dir.display())
            })?;
            info!("Created output directory {}", out_dir.display());
        }

        info!("Loading {}", input_path.display());
        let mut dataset = Dataset::load(input_path)?;
        prepare_dataset(&mut dataset)?;
        debug!(rows = dataset.height(), "Dataset prepared");

        let artifacts = build_artifacts(&dataset)?;
        for artifact in &artifacts {
            artifact.validate()?;
        }

        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            let path = out_dir.join(artifact.file_name());
            artifact
                .render(&path, self.config.scale_factor)
                .with_context(|| format!("Failed to render {}", path.display()))?;
            info!("Saved {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use polars::prelude::*;

    #[test]
    fn test_report_config() {
        assert_eq!(ReportConfig::default().scale_factor, DEFAULT_SCALE_FACTOR);
        assert!(ReportConfig::new(1).is_ok());
        assert!(ReportConfig::new(MAX_SCALE_FACTOR).is_ok());

        let err = ReportConfig::new(0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EdaError>(),
            Some(&EdaError::InvalidScaleFactor(0))
        );
        assert!(ReportConfig::new(MAX_SCALE_FACTOR + 1).is_err());
    }

    #[test]
    fn test_required_columns() {
        let columns = required_columns();
        assert_eq!(columns.len(), 19);
        assert!(columns.contains(&"Payment Method"));
        assert_eq!(columns.last(), Some(&LABEL_COLUMN));
    }

    #[test]
    fn test_file_names_are_distinct() {
        let artifacts = [
            Artifact::CategoricalTable(CategoricalSummary { rows: vec![] }),
            Artifact::ClassImbalance(ClassBalance { counts: vec![] }),
            Artifact::NumericDistribution(vec![]),
            Artifact::NumericCorrelation(CorrelationMatrix {
                columns: vec![],
                values: Array2::zeros((0, 0)),
            }),
            Artifact::CategoryChurnDistribution(vec![]),
            Artifact::CategoryCrossCounts(vec![]),
        ];
        let mut names: Vec<&str> = artifacts.iter().map(Artifact::file_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
        assert_eq!(names.len(), artifacts.len());
    }

    #[test]
    fn test_validate_rejects_empty_artifacts() {
        let empty = Artifact::ClassImbalance(ClassBalance { counts: vec![] });
        let err = empty.validate().unwrap_err();
        assert_eq!(
            err.downcast_ref::<EdaError>(),
            Some(&EdaError::EmptyArtifact("figure_1_class_imbalance.png"))
        );

        let balance = Artifact::ClassImbalance(ClassBalance {
            counts: vec![("False".to_string(), 3)],
        });
        assert!(balance.validate().is_ok());

        assert!(Artifact::CategoryCrossCounts(vec![]).validate().is_err());
        assert!(Artifact::NumericDistribution(vec![]).validate().is_err());
    }

    #[test]
    fn test_validate_accepts_empty_panels() {
        let labels = vec!["True".to_string(), "False".to_string()];
        let no_values: Vec<Option<f64>> = vec![None, None];
        let no_categories: Vec<Option<String>> = vec![None, None];

        let histograms = NUMERIC_FEATURES
            .iter()
            .map(|feature| summary::histogram(feature, &no_values, &labels, summary::MAX_BINS))
            .collect();
        assert!(Artifact::NumericDistribution(histograms).validate().is_ok());

        let panels: Vec<CategoryCounts> = CHURN_DISTRIBUTION_FEATURES
            .iter()
            .map(|feature| summary::category_counts(feature, &no_categories, &labels))
            .collect();
        assert!(Artifact::CategoryChurnDistribution(panels.clone())
            .validate()
            .is_ok());
        assert!(Artifact::CategoryCrossCounts(panels).validate().is_err());

        let no_numeric_columns = Artifact::NumericCorrelation(CorrelationMatrix {
            columns: vec![],
            values: Array2::zeros((0, 0)),
        });
        assert!(no_numeric_columns.validate().is_ok());
    }

    #[test]
    fn test_prepare_dataset_reports_missing_columns() {
        let frame = df!(
            "tenure" => [1i64, 2],
            "Churn" => [true, false]
        )
        .unwrap();
        let mut dataset = Dataset::from_frame(frame);

        let err = prepare_dataset(&mut dataset).unwrap_err();
        match err.downcast_ref::<EdaError>() {
            Some(EdaError::MissingColumns(missing)) => {
                assert!(!missing.contains(&"Tenure".to_string()));
                assert!(missing.contains(&"Monthly Charges".to_string()));
                assert_eq!(missing.len(), 17);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
