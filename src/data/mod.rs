//! Dataset store primitives
//!
//! - [`loader`] decodes uploaded bytes (CSV or spreadsheet) into a DataFrame
//! - [`preview`] renders the head of a table as JSON records
//!
//! The helpers below are shared by every stage that needs to look at
//! columns by kind (numeric features, target labels).

pub mod loader;
pub mod preview;

pub use loader::{DataLoader, FileFormat};
pub use preview::{render_preview, Preview};

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use polars::prelude::*;

/// A decoded table and the file name it was uploaded under
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub frame: DataFrame,
}

impl Dataset {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }

    pub fn rows(&self) -> usize {
        self.frame.height()
    }

    pub fn columns(&self) -> usize {
        self.frame.width()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }
}

/// Whether a column of this type counts as numeric.
///
/// Booleans count, matching how tabular tools treat 0/1 flags.
pub fn is_numeric(dtype: &DataType) -> bool {
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

/// Names of the numeric columns of `frame`, in column order, minus `exclude`
pub fn numeric_columns(frame: &DataFrame, exclude: Option<&str>) -> Vec<String> {
    frame
        .get_columns()
        .iter()
        .filter(|col| is_numeric(col.dtype()))
        .map(|col| col.name().to_string())
        .filter(|name| exclude.map_or(true, |ex| name != ex))
        .collect()
}

/// A column cast to `Float64`, nulls preserved
pub fn float_column(frame: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = frame
        .column(name)
        .map_err(|_| PipelineError::Processing(format!("column '{}' not found", name)))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.clone())
}

/// Render a target column as class labels; missing cells become `None`.
///
/// Numbers are rendered without a trailing `.0` so that `1` and `1.0`
/// name the same class.
pub fn label_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = frame
        .column(name)
        .map_err(|_| PipelineError::Processing(format!("column '{}' not found", name)))?;

    (0..column.len())
        .map(|i| Ok(label_of(column.get(i)?)))
        .collect()
}

fn label_of(value: AnyValue) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        AnyValue::Float64(v) if v.is_nan() => None,
        AnyValue::Float64(v) => Some(v.to_string()),
        AnyValue::Float32(v) if v.is_nan() => None,
        AnyValue::Float32(v) => Some(v.to_string()),
        AnyValue::Boolean(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Extract named columns into a row-major matrix.
///
/// Callers impute first; a remaining null would be read as 0.0.
pub fn columns_to_array2(frame: &DataFrame, names: &[String]) -> Result<Array2<f64>> {
    let n_rows = frame.height();
    let col_data: Vec<Vec<f64>> = names
        .iter()
        .map(|name| {
            let ca = float_column(frame, name)?;
            Ok(ca.into_iter().map(|v| v.unwrap_or(0.0)).collect())
        })
        .collect::<Result<_>>()?;

    Ok(Array2::from_shape_fn((n_rows, names.len()), |(r, c)| {
        col_data[c][r]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "a" => &[1.0, 2.0, 3.0],
            "b" => &[Some(4i64), None, Some(6)],
            "label" => &["x", "y", "x"]
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_columns_excludes_target_and_text() {
        let df = sample();
        assert_eq!(numeric_columns(&df, None), vec!["a", "b"]);
        assert_eq!(numeric_columns(&df, Some("a")), vec!["b"]);
    }

    #[test]
    fn test_label_values() {
        let df = df!(
            "n" => &[Some(1.0), None, Some(2.5)],
        )
        .unwrap();
        let labels = label_values(&df, "n").unwrap();
        assert_eq!(labels, vec![Some("1".to_string()), None, Some("2.5".to_string())]);
    }

    #[test]
    fn test_columns_to_array2_is_row_major() {
        let df = sample();
        let x = columns_to_array2(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(x[[0, 0]], 1.0);
        assert_eq!(x[[0, 1]], 4.0);
        assert_eq!(x[[2, 1]], 6.0);
    }
}
