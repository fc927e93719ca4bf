//! Classifier selection and scoring

use super::decision_tree::DecisionTree;
use super::logistic::LogisticRegression;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classifiers offered by the train stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    DecisionTree,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::DecisionTree => "decision_tree",
        }
    }

    /// A fresh, unfitted model of this kind
    pub fn build(self) -> Model {
        match self {
            ModelKind::LogisticRegression => {
                Model::LogisticRegression(LogisticRegression::new().with_max_iter(1000))
            }
            ModelKind::DecisionTree => Model::DecisionTree(DecisionTree::new()),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "logistic_regression" => Ok(ModelKind::LogisticRegression),
            "decision_tree" => Ok(ModelKind::DecisionTree),
            other => Err(PipelineError::InvalidModel(other.to_string())),
        }
    }
}

/// Uniform fit/predict over class indices stored as `f64`
pub trait Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// A model of one of the supported kinds
#[derive(Debug, Clone)]
pub enum Model {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::LogisticRegression(_) => ModelKind::LogisticRegression,
            Model::DecisionTree(_) => ModelKind::DecisionTree,
        }
    }
}

impl Classifier for Model {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Model::LogisticRegression(m) => m.fit(x, y).map(|_| ()),
            Model::DecisionTree(m) => m.fit(x, y).map(|_| ()),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Model::LogisticRegression(m) => m.predict(x),
            Model::DecisionTree(m) => m.predict(x),
        }
    }
}

/// Fraction of exact label matches; 0.0 for an empty set
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}
