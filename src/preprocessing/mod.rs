//! Feature preprocessing
//!
//! Mean imputation followed by standardization or min-max normalization
//! over the numeric feature columns. Non-feature columns pass through.

mod imputer;
mod scaler;

pub use imputer::MeanImputer;
pub use scaler::{Scaler, ScalingStrategy};

use crate::error::Result;
use polars::prelude::*;

/// Imputes then scales a chosen set of feature columns
#[derive(Debug, Clone)]
pub struct DataPreprocessor {
    imputer: MeanImputer,
    scaler: Scaler,
}

impl DataPreprocessor {
    pub fn new(strategy: ScalingStrategy) -> Self {
        Self {
            imputer: MeanImputer::new(),
            scaler: Scaler::new(strategy),
        }
    }

    pub fn strategy(&self) -> ScalingStrategy {
        self.scaler.strategy()
    }

    /// Return a copy of `df` with `features` imputed and scaled
    pub fn fit_transform(&mut self, df: &DataFrame, features: &[String]) -> Result<DataFrame> {
        let imputed = self.imputer.fit_transform(df, features)?;
        self.scaler.fit_transform(&imputed, features)
    }
}
