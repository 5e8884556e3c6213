//! Summary statistics behind each chart and the categorical table

use crate::data::Dataset;
use ndarray::Array2;
use std::collections::{BTreeSet, HashSet};

/// Upper bound on histogram bins per numeric feature
pub const MAX_BINS: usize = 40;

/// Row count per label value
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBalance {
    /// (label, count) sorted by label
    pub counts: Vec<(String, usize)>,
}

impl ClassBalance {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

/// Evenly spaced bin edges starting at `start`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bins {
    pub start: f64,
    pub step: f64,
    pub count: usize,
}

impl Bins {
    /// Choose "nice" bins covering `min..=max` with at most `max_bins` bins.
    ///
    /// Steps are powers of ten, refined by dividing by 5 or 2 while the bin
    /// count stays within bounds.
    pub fn nice(min: f64, max: f64, max_bins: usize) -> Self {
        let max_bins = max_bins.max(1) as f64;
        let span = if max > min { max - min } else { 1.0 };

        let level = max_bins.log10().ceil();
        let mut step = 10f64.powf(span.log10().round() - level);
        while (span / step).ceil() > max_bins {
            step *= 10.0;
        }
        for divisor in [5.0, 2.0] {
            let candidate = step / divisor;
            if span / candidate <= max_bins {
                step = candidate;
            }
        }

        let start = (min / step).floor() * step;
        let stop = ((max / step).ceil() * step).max(start + step);
        let count = ((stop - start) / step).round().max(1.0) as usize;
        Self { start, step, count }
    }

    pub fn edges(&self, index: usize) -> (f64, f64) {
        let lower = self.start + index as f64 * self.step;
        (lower, lower + self.step)
    }

    pub fn end(&self) -> f64 {
        self.start + self.count as f64 * self.step
    }

    /// Bin holding `value`; the upper edge belongs to the last bin
    pub fn index_of(&self, value: f64) -> Option<usize> {
        let slack = self.step * 1e-9;
        if value < self.start - slack || value > self.end() + slack {
            return None;
        }
        let index = ((value - self.start) / self.step).floor().max(0.0) as usize;
        Some(index.min(self.count - 1))
    }
}

/// Histogram of one numeric feature split by label
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub feature: String,
    pub bins: Bins,
    /// (label, count per bin) sorted by label
    pub counts: Vec<(String, Vec<usize>)>,
}

impl Histogram {
    pub fn max_count(&self) -> usize {
        self.counts
            .iter()
            .flat_map(|(_, counts)| counts.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Pearson correlation between numeric columns
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

/// Row counts for each (category, label) pair of one feature
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCounts {
    pub feature: String,
    pub categories: Vec<String>,
    pub labels: Vec<String>,
    /// Shape (categories, labels)
    pub counts: Array2<usize>,
}

impl CategoryCounts {
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn category_total(&self, category: usize) -> usize {
        self.counts.row(category).sum()
    }
}

/// One row of the categorical feature table
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummaryRow {
    pub feature: String,
    /// Distinct non-missing values in first-seen order
    pub unique_values: Vec<String>,
    pub categories: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub rows: Vec<CategoricalSummaryRow>,
}

/// Count rows per label value
pub fn class_balance(labels: &[String]) -> ClassBalance {
    let distinct: BTreeSet<&String> = labels.iter().collect();
    let counts = distinct
        .into_iter()
        .map(|label| {
            let count = labels.iter().filter(|l| *l == label).count();
            (label.clone(), count)
        })
        .collect();
    ClassBalance { counts }
}

/// Histogram of `values` split by `labels`. Missing values are skipped.
///
/// A feature with no values at all gets a single empty bin at zero.
pub fn histogram(
    feature: &str,
    values: &[Option<f64>],
    labels: &[String],
    max_bins: usize,
) -> Histogram {
    let present: Vec<(f64, &String)> = values
        .iter()
        .zip(labels)
        .filter_map(|(value, label)| value.map(|v| (v, label)))
        .collect();

    let min = present.iter().map(|(v, _)| *v).fold(f64::INFINITY, f64::min);
    let max = present
        .iter()
        .map(|(v, _)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    let bins = if min.is_finite() && max.is_finite() {
        Bins::nice(min, max, max_bins)
    } else {
        Bins::nice(0.0, 0.0, max_bins)
    };
    let distinct: BTreeSet<&String> = labels.iter().collect();
    let counts = distinct
        .into_iter()
        .map(|label| {
            let mut counts = vec![0; bins.count];
            for (value, _) in present.iter().filter(|(_, l)| *l == label) {
                if let Some(index) = bins.index_of(*value) {
                    counts[index] += 1;
                }
            }
            (label.clone(), counts)
        })
        .collect();

    Histogram {
        feature: feature.to_string(),
        bins,
        counts,
    }
}

/// Pearson correlation over pairwise-complete observations.
///
/// A pair with fewer than two shared observations or a constant side is NaN.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Correlation matrix over every numeric column of the dataset
pub fn correlation_matrix(dataset: &Dataset) -> crate::Result<CorrelationMatrix> {
    let columns = dataset.numeric_columns();
    let series = columns
        .iter()
        .map(|name| dataset.numeric_values(name))
        .collect::<crate::Result<Vec<_>>>()?;

    let n = columns.len();
    let mut values = Array2::from_elem((n, n), f64::NAN);
    for i in 0..n {
        for j in i..n {
            let r = pearson(&series[i], &series[j]);
            values[[i, j]] = r;
            values[[j, i]] = r;
        }
    }

    Ok(CorrelationMatrix { columns, values })
}

/// Count rows per (category, label). Rows with a missing category are skipped.
pub fn category_counts(
    feature: &str,
    categories: &[Option<String>],
    labels: &[String],
) -> CategoryCounts {
    let category_names: Vec<String> = categories
        .iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();
    let label_names: Vec<String> = labels
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();

    let mut counts = Array2::zeros((category_names.len(), label_names.len()));
    for (category, label) in categories.iter().zip(labels) {
        let Some(category) = category else { continue };
        let row = category_names.binary_search(category);
        let col = label_names.binary_search(label);
        if let (Ok(row), Ok(col)) = (row, col) {
            counts[[row, col]] += 1;
        }
    }

    CategoryCounts {
        feature: feature.to_string(),
        categories: category_names,
        labels: label_names,
        counts,
    }
}

/// Category counts for each of `features`
pub fn category_panels(
    dataset: &Dataset,
    features: &[&str],
    labels: &[String],
) -> crate::Result<Vec<CategoryCounts>> {
    features
        .iter()
        .map(|feature| -> crate::Result<CategoryCounts> {
            let values = dataset.string_values(feature)?;
            Ok(category_counts(feature, &values, labels))
        })
        .collect()
}

/// Unique and missing value counts for a single column
pub fn summarize_column(feature: &str, values: &[Option<String>]) -> CategoricalSummaryRow {
    let mut seen = HashSet::new();
    let mut unique_values = Vec::new();
    let mut missing = 0;

    for value in values {
        match value {
            Some(value) => {
                if seen.insert(value.as_str()) {
                    unique_values.push(value.clone());
                }
            }
            None => missing += 1,
        }
    }

    CategoricalSummaryRow {
        feature: feature.to_string(),
        categories: unique_values.len(),
        unique_values,
        missing,
    }
}

/// Table of every non-numeric column of the dataset
pub fn categorical_summary(dataset: &Dataset) -> crate::Result<CategoricalSummary> {
    let rows = dataset
        .categorical_columns()
        .iter()
        .map(|name| -> crate::Result<CategoricalSummaryRow> {
            Ok(summarize_column(name, &dataset.string_values(name)?))
        })
        .collect::<crate::Result<Vec<_>>>()?;
    Ok(CategoricalSummary { rows })
}
