//! Feature scaling implementations

use crate::data::float_column;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scaling applied to every feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingStrategy {
    /// z-score with population statistics: (x - mean) / std
    Standardization,
    /// Min-max onto [0, 1]: (x - min) / (max - min)
    Normalization,
}

impl ScalingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingStrategy::Standardization => "standardization",
            ScalingStrategy::Normalization => "normalization",
        }
    }
}

impl fmt::Display for ScalingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalingStrategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standardization" => Ok(ScalingStrategy::Standardization),
            "normalization" => Ok(ScalingStrategy::Normalization),
            other => Err(PipelineError::InvalidStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ScalerParams {
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Column-wise scaler over already-imputed `Float64` columns
#[derive(Debug, Clone)]
pub struct Scaler {
    strategy: ScalingStrategy,
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(strategy: ScalingStrategy) -> Self {
        Self {
            strategy,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> ScalingStrategy {
        self.strategy
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.params = columns
            .iter()
            .map(|name| {
                let ca = float_column(df, name)?;
                Ok((name.clone(), self.compute_params(&ca)))
            })
            .collect::<Result<_>>()?;
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace every fitted column with its scaled version
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::Processing("scaler used before fit".to_string()));
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(name, params)| {
                let ca = float_column(df, name)?;
                let scaled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| opt.map(|v| (v - params.center) / params.scale))
                    .collect();
                Ok(scaled.with_name(name.as_str().into()).into_series())
            })
            .collect::<Result<_>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    // Degenerate columns keep a unit scale so constants map to 0
    fn compute_params(&self, ca: &Float64Chunked) -> ScalerParams {
        match self.strategy {
            ScalingStrategy::Standardization => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(0).unwrap_or(1.0);
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 || !std.is_finite() { 1.0 } else { std },
                }
            }
            ScalingStrategy::Normalization => {
                let min = ca.min().unwrap_or(0.0);
                let max = ca.max().unwrap_or(1.0);
                let range = max - min;
                ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                }
            }
        }
    }
}
