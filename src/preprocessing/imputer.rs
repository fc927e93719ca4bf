//! Mean imputation for numeric columns

use crate::data::float_column;
use crate::error::{PipelineError, Result};
use polars::prelude::*;

/// Replaces missing numeric cells with the mean of the observed cells.
///
/// Fitted columns are cast to `Float64` on transform. A column with no
/// observed value imputes to 0.0.
#[derive(Debug, Clone, Default)]
pub struct MeanImputer {
    means: Vec<(String, f64)>,
    is_fitted: bool,
}

impl MeanImputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn per-column means over non-missing values
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.means = columns
            .iter()
            .map(|name| {
                let mean = float_column(df, name)?.mean().unwrap_or(0.0);
                Ok((name.clone(), mean))
            })
            .collect::<Result<_>>()?;
        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::Processing("imputer used before fit".to_string()));
        }

        let mut result = df.clone();
        for (name, mean) in &self.means {
            let filled: Float64Chunked = float_column(df, name)?
                .into_iter()
                .map(|v| Some(v.unwrap_or(*mean)))
                .collect();
            result.with_column(filled.with_name(name.as_str().into()).into_series())?;
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted mean for `column`
    pub fn mean(&self, column: &str) -> Option<f64> {
        self.means
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, mean)| *mean)
    }
}
