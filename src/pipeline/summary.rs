//! Serializable results of the pipeline operations

use super::Stage;
use crate::preprocessing::ScalingStrategy;
use crate::training::{ModelKind, SourceKind};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub message: String,
    pub filename: String,
    pub row_count: usize,
    pub column_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSummary {
    pub target_column: String,
    pub unique_values: usize,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessSummary {
    pub strategy: ScalingStrategy,
    pub features_used: Vec<String>,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevertSummary {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitSummary {
    pub split_ratio: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub total_rows: usize,
    pub source: SourceKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitInfo {
    pub split_ratio: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub source: SourceKind,
}

/// Outcome of one training call; `accuracy` is measured on the test partition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainSummary {
    pub model: ModelKind,
    pub accuracy: f64,
    pub train_accuracy: f64,
    pub status: String,
}

/// Readiness snapshot of the pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_column: Option<String>,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_training: Option<TrainSummary>,
}
