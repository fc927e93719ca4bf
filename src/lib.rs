//! mlstep - Stepwise tabular ML pipeline
//!
//! One dataset lineage walked through a fixed sequence of stages:
//! load, target selection, optional preprocessing, train/test split and
//! training. Each stage returns a serializable summary.
//!
//! # Modules
//!
//! ## Core
//! - [`pipeline`] - Stage controller owning the current lineage
//! - [`data`] - Upload decoding and table previews
//! - [`preprocessing`] - Mean imputation, standardization, normalization
//! - [`training`] - Seeded split, classifiers, accuracy
//!
//! ## Services
//! - [`server`] - HTTP gateway
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core pipeline
pub mod data;
pub mod pipeline;
pub mod preprocessing;
pub mod training;

// Services
pub mod server;
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};

    // Pipeline
    pub use crate::pipeline::{Operation, Pipeline, PipelineConfig, Stage};

    // Data
    pub use crate::data::{DataLoader, Dataset, FileFormat, Preview};

    // Preprocessing
    pub use crate::preprocessing::{DataPreprocessor, ScalingStrategy};

    // Training
    pub use crate::training::{Classifier, Model, ModelKind, SourceKind, SplitSet, TrainTestSplitter};
}
