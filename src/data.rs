//! Dataset loading and column preparation using Polars

use crate::error::EdaError;
use anyhow::Context;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Binary target column used to split every chart
pub const LABEL_COLUMN: &str = "Churn";

/// Source column names and the display names they are renamed to
pub const COLUMN_RENAMES: [(&str, &str); 15] = [
    ("tenure", "Tenure"),
    ("SeniorCitizen", "Senior Citizen"),
    ("MonthlyCharges", "Monthly Charges"),
    ("TotalCharges", "Total Charges"),
    ("InternetService", "Internet Service"),
    ("MultipleLines", "Multiple Lines"),
    ("OnlineSecurity", "Online Security"),
    ("OnlineBackup", "Online Backup"),
    ("DeviceProtection", "Device Protection"),
    ("StreamingMovies", "Streaming Movies"),
    ("StreamingTV", "Streaming TV"),
    ("PhoneService", "Phone Service"),
    ("TechSupport", "Tech Support"),
    ("PaperlessBilling", "Paperless Billing"),
    ("PaymentMethod", "Payment Method"),
];

/// In-memory churn table
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Wrap an already loaded frame
    pub fn from_frame(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Load a CSV file with a header row, inferring the schema from the data.
    ///
    /// Empty fields are read as nulls.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10_000))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to open {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to parse CSV {}", path.display()))?;

        debug!(rows = frame.height(), columns = frame.width(), "Loaded {}", path.display());
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Rewrite the label column to the literal strings "True" and "False".
    ///
    /// Booleans, `true`/`false` in any case and the integers 1/0 are accepted.
    /// Anything else, including nulls, is rejected with the offending row.
    pub fn normalize_label(&mut self) -> crate::Result<()> {
        let column = self.column(LABEL_COLUMN)?;
        let as_text = column.as_materialized_series().cast(&DataType::String)?;

        let normalized = as_text
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value.and_then(parse_label) {
                Some(true) => Ok("True"),
                Some(false) => Ok("False"),
                None => Err(EdaError::InvalidLabel {
                    row,
                    value: value.unwrap_or("null").to_string(),
                }),
            })
            .collect::<std::result::Result<Vec<&str>, EdaError>>()?;

        self.frame
            .with_column(Series::new(LABEL_COLUMN.into(), normalized))?;
        Ok(())
    }

    /// Apply [`COLUMN_RENAMES`] to every source column present in the frame.
    ///
    /// Returns the number of columns renamed.
    pub fn rename_columns(&mut self) -> crate::Result<usize> {
        let mut renamed = 0;
        for (source, display) in COLUMN_RENAMES {
            if self.has_column(source) {
                self.frame.rename(source, display.into())?;
                renamed += 1;
            }
        }
        debug!(renamed, "Renamed columns to display names");
        Ok(renamed)
    }

    /// Fail with every name from `names` that is absent from the frame
    pub fn require_columns(&self, names: &[&str]) -> crate::Result<()> {
        let missing: Vec<String> = names
            .iter()
            .filter(|&&name| !self.has_column(name))
            .map(|&name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(EdaError::MissingColumns(missing).into());
        }
        Ok(())
    }

    /// Boolean, integer and floating-point columns, in frame order
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_where(|dtype| is_numeric(dtype))
    }

    /// Every column that is not numeric, in frame order
    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns_where(|dtype| !is_numeric(dtype))
    }

    /// Column values as floats. Values that cannot be cast become `None`.
    pub fn numeric_values(&self, name: &str) -> crate::Result<Vec<Option<f64>>> {
        let series = self
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let values = series
            .f64()?
            .into_iter()
            .map(|value| value.filter(|v| !v.is_nan()))
            .collect();
        Ok(values)
    }

    /// Column values rendered as strings, nulls kept as `None`
    pub fn string_values(&self, name: &str) -> crate::Result<Vec<Option<String>>> {
        let series = self
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values = series
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_owned))
            .collect();
        Ok(values)
    }

    /// Normalized label of each row. Call after [`Dataset::normalize_label`].
    pub fn labels(&self) -> crate::Result<Vec<String>> {
        self.string_values(LABEL_COLUMN)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    anyhow::Error::from(EdaError::InvalidLabel {
                        row,
                        value: "null".to_string(),
                    })
                })
            })
            .collect()
    }

    fn column(&self, name: &str) -> crate::Result<&Column> {
        self.frame
            .column(name)
            .map_err(|_| EdaError::MissingColumn(name.to_string()).into())
    }

    fn columns_where(&self, predicate: impl Fn(&DataType) -> bool) -> Vec<String> {
        self.frame
            .get_columns()
            .iter()
            .filter(|column| predicate(column.dtype()))
            .map(|column| column.name().to_string())
            .collect()
    }
}

/// Booleans count as numeric: they correlate as 0/1 and stay out of the categorical table
fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn parse_label(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "customerID,gender,SeniorCitizen,tenure,MonthlyCharges,PaymentMethod,Churn"
        )
        .unwrap();
        writeln!(file, "7590-VHVEG,Female,0,1,29.85,Electronic check,False").unwrap();
        writeln!(file, "5575-GNVDE,Male,0,34,56.95,Mailed check,False").unwrap();
        writeln!(file, "3668-QPYBK,Male,1,2,53.85,,True").unwrap();
        writeln!(file, "7795-CFOCW,Male,0,45,42.30,Bank transfer (automatic),True").unwrap();
        file
    }

    fn load_test_dataset() -> Dataset {
        let file = create_test_csv();
        Dataset::load(file.path()).unwrap()
    }

    #[test]
    fn test_load() {
        let dataset = load_test_dataset();
        assert_eq!(dataset.height(), 4);
        assert_eq!(dataset.column_names().len(), 7);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Dataset::load("/nonexistent/churn.csv").is_err());
    }

    #[test]
    fn test_normalize_boolean_label() {
        let mut dataset = load_test_dataset();
        dataset.normalize_label().unwrap();

        let labels = dataset.labels().unwrap();
        assert_eq!(labels, vec!["False", "False", "True", "True"]);
        assert_eq!(
            dataset.frame().column(LABEL_COLUMN).unwrap().dtype(),
            &DataType::String
        );
    }

    #[test]
    fn test_normalize_string_and_integer_labels() {
        let frame = df!(LABEL_COLUMN => ["true", "FALSE", "True"]).unwrap();
        let mut dataset = Dataset::from_frame(frame);
        dataset.normalize_label().unwrap();
        assert_eq!(dataset.labels().unwrap(), vec!["True", "False", "True"]);

        let frame = df!(LABEL_COLUMN => [1i64, 0, 0]).unwrap();
        let mut dataset = Dataset::from_frame(frame);
        dataset.normalize_label().unwrap();
        assert_eq!(dataset.labels().unwrap(), vec!["True", "False", "False"]);
    }

    #[test]
    fn test_normalize_rejects_unknown_label() {
        let frame = df!(LABEL_COLUMN => [Some("True"), None, Some("False")]).unwrap();
        let mut dataset = Dataset::from_frame(frame);
        let err = dataset.normalize_label().unwrap_err();
        assert_eq!(
            err.downcast_ref::<EdaError>(),
            Some(&EdaError::InvalidLabel {
                row: 1,
                value: "null".to_string()
            })
        );

        let frame = df!(LABEL_COLUMN => ["Yes", "No"]).unwrap();
        let mut dataset = Dataset::from_frame(frame);
        assert!(dataset.normalize_label().is_err());
    }

    #[test]
    fn test_normalize_without_label_column() {
        let frame = df!("tenure" => [1i64, 2]).unwrap();
        let mut dataset = Dataset::from_frame(frame);
        let err = dataset.normalize_label().unwrap_err();
        assert_eq!(
            err.downcast_ref::<EdaError>(),
            Some(&EdaError::MissingColumn(LABEL_COLUMN.to_string()))
        );
    }

    #[test]
    fn test_rename_columns() {
        let mut dataset = load_test_dataset();
        let renamed = dataset.rename_columns().unwrap();
        assert_eq!(renamed, 4);

        let names = dataset.column_names();
        assert_eq!(
            names,
            vec![
                "customerID",
                "gender",
                "Senior Citizen",
                "Tenure",
                "Monthly Charges",
                "Payment Method",
                "Churn"
            ]
        );
    }

    #[test]
    fn test_rename_is_noop_on_display_names() {
        let mut dataset = load_test_dataset();
        dataset.rename_columns().unwrap();
        assert_eq!(dataset.rename_columns().unwrap(), 0);
    }

    #[test]
    fn test_require_columns() {
        let dataset = load_test_dataset();
        assert!(dataset.require_columns(&["gender", "Churn"]).is_ok());

        let err = dataset
            .require_columns(&["gender", "Contract", "Partner"])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<EdaError>(),
            Some(&EdaError::MissingColumns(vec![
                "Contract".to_string(),
                "Partner".to_string()
            ]))
        );
    }

    #[test]
    fn test_column_classes() {
        let mut dataset = load_test_dataset();
        dataset.normalize_label().unwrap();

        assert_eq!(
            dataset.numeric_columns(),
            vec!["SeniorCitizen", "tenure", "MonthlyCharges"]
        );
        assert_eq!(
            dataset.categorical_columns(),
            vec!["customerID", "gender", "PaymentMethod", "Churn"]
        );
    }

    #[test]
    fn test_boolean_and_narrow_integer_columns_are_numeric() {
        let frame = df!(
            "flag" => [true, false, true],
            "small" => [1i8, 2, 3],
            "count" => [10u16, 20, 30],
            "gender" => ["Male", "Female", "Male"]
        )
        .unwrap();
        let dataset = Dataset::from_frame(frame);

        assert_eq!(dataset.numeric_columns(), vec!["flag", "small", "count"]);
        assert_eq!(dataset.categorical_columns(), vec!["gender"]);
        assert_eq!(
            dataset.numeric_values("flag").unwrap(),
            vec![Some(1.0), Some(0.0), Some(1.0)]
        );
        assert_eq!(
            dataset.numeric_values("small").unwrap(),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_column_values() {
        let dataset = load_test_dataset();

        let tenure = dataset.numeric_values("tenure").unwrap();
        assert_eq!(tenure, vec![Some(1.0), Some(34.0), Some(2.0), Some(45.0)]);

        let payment = dataset.string_values("PaymentMethod").unwrap();
        assert_eq!(payment[2], None);
        assert_eq!(payment[1].as_deref(), Some("Mailed check"));

        let senior = dataset.string_values("SeniorCitizen").unwrap();
        assert_eq!(senior[2].as_deref(), Some("1"));
    }

    #[test]
    fn test_numeric_values_of_text_column() {
        let frame = df!("Total Charges" => ["29.85", " ", "108.15"]).unwrap();
        let dataset = Dataset::from_frame(frame);
        let values = dataset.numeric_values("Total Charges").unwrap();
        assert_eq!(values, vec![Some(29.85), None, Some(108.15)]);
    }
}
