//! Error types for the mlstep pipeline

use thiserror::Error;

use crate::pipeline::Operation;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every failure a stage operation can report.
///
/// A failed operation never mutates the pipeline, so all of these are
/// recoverable at the caller's discretion.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported file format: '{0}'. Please upload a CSV or Excel file.")]
    UnsupportedFormat(String),

    #[error("The uploaded file is empty.")]
    EmptyDataset,

    #[error("No dataset uploaded. Upload a dataset before {0}.")]
    NoDataset(Operation),

    #[error("Target column must be selected before {0}.")]
    NoTarget(Operation),

    #[error("Invalid target column: {0}")]
    InvalidTarget(String),

    #[error("Invalid preprocessing strategy '{0}'. Use 'standardization' or 'normalization'.")]
    InvalidStrategy(String),

    #[error("No numeric feature columns found (target is excluded).")]
    NoFeatures,

    #[error("Data has not been processed yet.")]
    NotProcessed,

    #[error("Invalid split ratio {ratio}: {reason}")]
    InvalidRatio { ratio: f64, reason: String },

    #[error("Feature and target row counts mismatch: {features} feature rows, {target} target rows")]
    RowCountMismatch { features: usize, target: usize },

    #[error("Data must be split before {0}.")]
    NotSplit(Operation),

    #[error("Invalid model type '{0}'. Use 'logistic_regression' or 'decision_tree'.")]
    InvalidModel(String),

    #[error("Processing failed: {0}")]
    Processing(String),
}

impl PipelineError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFormat(_) => "unsupported_format",
            PipelineError::EmptyDataset => "empty_dataset",
            PipelineError::NoDataset(_) => "no_dataset",
            PipelineError::NoTarget(_) => "no_target",
            PipelineError::InvalidTarget(_) => "invalid_target",
            PipelineError::InvalidStrategy(_) => "invalid_strategy",
            PipelineError::NoFeatures => "no_features",
            PipelineError::NotProcessed => "not_processed",
            PipelineError::InvalidRatio { .. } => "invalid_ratio",
            PipelineError::RowCountMismatch { .. } => "row_count_mismatch",
            PipelineError::NotSplit(_) => "not_split",
            PipelineError::InvalidModel(_) => "invalid_model",
            PipelineError::Processing(_) => "processing_failed",
        }
    }

    /// True when a required predecessor stage has not been reached
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PipelineError::NoDataset(_)
                | PipelineError::NoTarget(_)
                | PipelineError::NotProcessed
                | PipelineError::NotSplit(_)
        )
    }

    /// True for faults whose detail must not be echoed back to a caller
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            PipelineError::Processing(_) | PipelineError::RowCountMismatch { .. }
        )
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::Processing(err.to_string())
    }
}

impl From<calamine::Error> for PipelineError {
    fn from(err: calamine::Error) -> Self {
        PipelineError::Processing(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::Processing(err.to_string())
    }
}
