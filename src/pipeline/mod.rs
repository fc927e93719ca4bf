//! Stage controller
//!
//! [`Pipeline`] owns the single dataset lineage (raw table, optional
//! processed table, split, last training report) and gates every
//! operation on the stages reached so far. Each operation either fully
//! applies or returns an error with the pipeline unchanged.

mod stage;
pub mod summary;

pub use stage::{Operation, Stage};
pub use summary::{
    LoadSummary, PreprocessSummary, RevertSummary, SplitInfo, SplitSummary, StatusSummary,
    TargetSummary, TrainSummary,
};

use crate::data::{self, DataLoader, Dataset, Preview};
use crate::error::{PipelineError, Result};
use crate::preprocessing::{DataPreprocessor, MeanImputer, ScalingStrategy};
use crate::training::{self, ModelKind, SourceKind, SplitSet, TrainTestSplitter};
use polars::prelude::DataFrame;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Constants of the stage controller
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Seed of the train/test shuffle
    pub seed: u64,
    /// Rows shown by a preview when no limit is given
    pub preview_limit: usize,
    /// Upper bound applied to any requested preview limit
    pub max_preview_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: training::split::DEFAULT_SEED,
            preview_limit: 50,
            max_preview_limit: 1000,
        }
    }
}

#[derive(Debug, Clone)]
struct TargetSelection {
    column: String,
    unique_values: usize,
}

#[derive(Debug, Clone)]
struct ProcessedTable {
    strategy: ScalingStrategy,
    features: Vec<String>,
    frame: DataFrame,
}

/// The stateful pipeline controller
#[derive(Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    loader: DataLoader,
    dataset: Option<Dataset>,
    target: Option<TargetSelection>,
    processed: Option<ProcessedTable>,
    split: Option<SplitSet>,
    last_training: Option<TrainSummary>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Furthest readiness stage reached by the current lineage
    pub fn stage(&self) -> Stage {
        if self.dataset.is_none() {
            Stage::Empty
        } else if self.last_training.is_some() {
            Stage::Trained
        } else if self.split.is_some() {
            Stage::Split
        } else if self.target.is_none() {
            Stage::Loaded
        } else if self.processed.is_some() {
            Stage::Preprocessed
        } else {
            Stage::TargetSet
        }
    }

    fn dataset(&self, op: Operation) -> Result<&Dataset> {
        self.dataset.as_ref().ok_or(PipelineError::NoDataset(op))
    }

    fn target(&self, op: Operation) -> Result<&TargetSelection> {
        self.dataset(op)?;
        self.target.as_ref().ok_or(PipelineError::NoTarget(op))
    }

    fn clamp_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.config.preview_limit)
            .min(self.config.max_preview_limit)
    }

    /// Decode an upload and make it the current dataset.
    ///
    /// Parsing happens before any state changes, so a failed load keeps
    /// the previous lineage. A successful load resets everything downstream.
    pub fn load(&mut self, bytes: &[u8], filename: &str) -> Result<LoadSummary> {
        let frame = self.loader.load_bytes(bytes, filename).map_err(|e| {
            warn!(filename, error = %e, "Rejected upload");
            e
        })?;
        let dataset = Dataset::new(filename, frame);

        let summary = LoadSummary {
            message: "File uploaded successfully".to_string(),
            filename: filename.to_string(),
            row_count: dataset.rows(),
            column_count: dataset.columns(),
        };

        self.dataset = Some(dataset);
        self.target = None;
        self.processed = None;
        self.split = None;
        self.last_training = None;

        info!(
            filename,
            rows = summary.row_count,
            columns = summary.column_count,
            "Dataset loaded"
        );
        Ok(summary)
    }

    /// First `limit` rows of the raw table
    pub fn preview(&self, limit: Option<usize>) -> Result<Preview> {
        let dataset = self.dataset(Operation::Preview)?;
        data::render_preview(&dataset.frame, self.clamp_limit(limit))
    }

    /// Choose the column to predict; may be called again to replace it
    pub fn select_target(&mut self, column: &str) -> Result<TargetSummary> {
        let dataset = self.dataset(Operation::SelectTarget)?;

        if !dataset.has_column(column) {
            return Err(PipelineError::InvalidTarget(format!(
                "column '{}' does not exist",
                column
            )));
        }

        let labels = data::label_values(&dataset.frame, column)?;
        let distinct: HashSet<&str> = labels.iter().flatten().map(String::as_str).collect();
        if distinct.is_empty() {
            return Err(PipelineError::InvalidTarget(format!(
                "column '{}' has no values",
                column
            )));
        }
        if distinct.len() < 2 {
            return Err(PipelineError::InvalidTarget(format!(
                "column '{}' must have at least two unique values",
                column
            )));
        }

        let unique_values = distinct.len();
        let rows = dataset.rows();
        self.target = Some(TargetSelection {
            column: column.to_string(),
            unique_values,
        });

        info!(column, unique_values, "Target selected");
        Ok(TargetSummary {
            target_column: column.to_string(),
            unique_values,
            rows,
            message: Some("Target column selected successfully".to_string()),
        })
    }

    pub fn target_info(&self) -> Result<TargetSummary> {
        let target = self.target(Operation::TargetInfo)?;
        let rows = self.dataset(Operation::TargetInfo)?.rows();
        Ok(TargetSummary {
            target_column: target.column.clone(),
            unique_values: target.unique_values,
            rows,
            message: None,
        })
    }

    /// Impute and scale the numeric non-target columns into a new table
    pub fn preprocess(&mut self, strategy: &str) -> Result<PreprocessSummary> {
        let dataset = self.dataset(Operation::Preprocess)?;
        let strategy: ScalingStrategy = strategy.parse()?;

        let exclude = self.target.as_ref().map(|t| t.column.as_str());
        let features = data::numeric_columns(&dataset.frame, exclude);
        if features.is_empty() {
            return Err(PipelineError::NoFeatures);
        }

        let mut preprocessor = DataPreprocessor::new(strategy);
        let frame = preprocessor.fit_transform(&dataset.frame, &features)?;
        let rows = frame.height();

        debug!(features = ?features, "Scaled feature columns");
        info!(%strategy, features = features.len(), rows, "Data preprocessed");

        self.processed = Some(ProcessedTable {
            strategy,
            features: features.clone(),
            frame,
        });

        Ok(PreprocessSummary {
            strategy,
            features_used: features,
            rows,
        })
    }

    /// First `limit` rows of the processed table
    pub fn processed_preview(&self, limit: Option<usize>) -> Result<Preview> {
        let processed = self.processed.as_ref().ok_or(PipelineError::NotProcessed)?;
        data::render_preview(&processed.frame, self.clamp_limit(limit))
    }

    /// Drop the processed table. An existing split is kept as is.
    pub fn revert_preprocess(&mut self) -> RevertSummary {
        if let Some(processed) = self.processed.take() {
            info!(
                strategy = %processed.strategy,
                features = processed.features.len(),
                "Preprocessing reverted"
            );
        }
        RevertSummary {
            message: "Preprocessing reverted. Back to original dataset.".to_string(),
        }
    }

    /// Partition features and target into train and test sets.
    ///
    /// Features come from the processed table when present, labels always
    /// from the raw target column.
    pub fn split(&mut self, ratio: f64) -> Result<SplitSummary> {
        let target = self.target(Operation::Split)?;
        let dataset = self.dataset(Operation::Split)?;
        let splitter = TrainTestSplitter::new(ratio)?.with_seed(self.config.seed);

        let (source_frame, source) = match &self.processed {
            Some(processed) => (&processed.frame, SourceKind::Processed),
            None => (&dataset.frame, SourceKind::Raw),
        };

        let features = data::numeric_columns(source_frame, Some(&target.column));
        if features.is_empty() {
            return Err(PipelineError::NoFeatures);
        }

        let imputed = MeanImputer::new().fit_transform(source_frame, &features)?;
        let x = data::columns_to_array2(&imputed, &features)?;
        let y = data::label_values(&dataset.frame, &target.column)?;

        let split = splitter.split(&x, &y, features, source)?;
        let summary = SplitSummary {
            split_ratio: split.ratio,
            train_rows: split.train_rows(),
            test_rows: split.test_rows(),
            total_rows: split.total_rows(),
            source,
            message: "Dataset split successfully".to_string(),
        };

        info!(
            ratio,
            train_rows = summary.train_rows,
            test_rows = summary.test_rows,
            source = ?source,
            "Dataset split"
        );
        self.split = Some(split);
        self.last_training = None;
        Ok(summary)
    }

    pub fn split_info(&self) -> Result<SplitInfo> {
        let split = self
            .split
            .as_ref()
            .ok_or(PipelineError::NotSplit(Operation::SplitInfo))?;
        Ok(split_info_of(split))
    }

    /// The current split, including which rows went to each partition
    pub fn split_set(&self) -> Option<&SplitSet> {
        self.split.as_ref()
    }

    /// Fit a fresh model on the train partition and score both partitions
    pub fn train(&mut self, model: &str) -> Result<TrainSummary> {
        let split = self
            .split
            .as_ref()
            .ok_or(PipelineError::NotSplit(Operation::Train))?;
        let kind: ModelKind = model.parse()?;

        let outcome = training::train_and_score(kind, split)?;
        let summary = TrainSummary {
            model: outcome.model,
            accuracy: outcome.test_accuracy,
            train_accuracy: outcome.train_accuracy,
            status: "Model trained successfully".to_string(),
        };
        self.last_training = Some(summary.clone());
        Ok(summary)
    }

    pub fn status(&self) -> StatusSummary {
        StatusSummary {
            stage: self.stage(),
            filename: self.dataset.as_ref().map(|d| d.name.clone()),
            target_column: self.target.as_ref().map(|t| t.column.clone()),
            processed: self.processed.is_some(),
            split: self.split.as_ref().map(split_info_of),
            last_training: self.last_training.clone(),
        }
    }
}

fn split_info_of(split: &SplitSet) -> SplitInfo {
    SplitInfo {
        split_ratio: split.ratio,
        train_rows: split.train_rows(),
        test_rows: split.test_rows(),
        source: split.source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IRIS_LIKE: &str = "a,b,label\n\
        1.0,10,x\n2.0,20,x\n3.0,30,y\n4.0,40,y\n5.0,50,x\n\
        6.0,60,y\n7.0,70,x\n8.0,80,y\n9.0,90,x\n10.0,100,y\n";

    fn loaded() -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline.load(IRIS_LIKE.as_bytes(), "data.csv").unwrap();
        pipeline
    }

    #[test]
    fn test_stage_progression() {
        let mut pipeline = Pipeline::new();
        assert_eq!(pipeline.stage(), Stage::Empty);

        pipeline.load(IRIS_LIKE.as_bytes(), "data.csv").unwrap();
        assert_eq!(pipeline.stage(), Stage::Loaded);

        pipeline.select_target("label").unwrap();
        assert_eq!(pipeline.stage(), Stage::TargetSet);

        pipeline.preprocess("normalization").unwrap();
        assert_eq!(pipeline.stage(), Stage::Preprocessed);

        pipeline.split(0.8).unwrap();
        assert_eq!(pipeline.stage(), Stage::Split);

        pipeline.train("decision_tree").unwrap();
        assert_eq!(pipeline.stage(), Stage::Trained);
    }

    #[test]
    fn test_operations_without_dataset() {
        let mut pipeline = Pipeline::new();
        assert!(matches!(pipeline.preview(None), Err(PipelineError::NoDataset(_))));
        assert!(matches!(
            pipeline.select_target("label"),
            Err(PipelineError::NoDataset(_))
        ));
        assert!(matches!(
            pipeline.preprocess("standardization"),
            Err(PipelineError::NoDataset(_))
        ));
        assert!(matches!(pipeline.split(0.8), Err(PipelineError::NoDataset(_))));
        assert!(matches!(pipeline.train("decision_tree"), Err(PipelineError::NotSplit(_))));
    }

    #[test]
    fn test_precondition_checked_before_argument() {
        let mut pipeline = loaded();
        // NoTarget wins over the out-of-range ratio
        assert!(matches!(pipeline.split(2.0), Err(PipelineError::NoTarget(_))));
        // NotSplit wins over the unknown model
        assert!(matches!(pipeline.train("svm"), Err(PipelineError::NotSplit(_))));
    }

    #[test]
    fn test_preprocess_excludes_target() {
        let mut pipeline = loaded();
        pipeline.select_target("b").unwrap();
        let summary = pipeline.preprocess("standardization").unwrap();
        assert_eq!(summary.features_used, vec!["a".to_string()]);
    }

    #[test]
    fn test_preprocess_without_target_uses_all_numeric() {
        let mut pipeline = loaded();
        let summary = pipeline.preprocess("standardization").unwrap();
        assert_eq!(summary.features_used, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_invalid_strategy_keeps_state() {
        let mut pipeline = loaded();
        let err = pipeline.preprocess("robust").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidStrategy(_)));
        assert!(matches!(
            pipeline.processed_preview(None),
            Err(PipelineError::NotProcessed)
        ));
    }

    #[test]
    fn test_preview_limit_is_clamped() {
        let mut pipeline = Pipeline::with_config(PipelineConfig {
            max_preview_limit: 3,
            ..PipelineConfig::default()
        });
        pipeline.load(IRIS_LIKE.as_bytes(), "data.csv").unwrap();
        assert_eq!(pipeline.preview(Some(100)).unwrap().rows.len(), 3);
        assert_eq!(pipeline.preview(Some(2)).unwrap().rows.len(), 2);
    }

    #[test]
    fn test_new_split_clears_training_report() {
        let mut pipeline = loaded();
        pipeline.select_target("label").unwrap();
        pipeline.split(0.8).unwrap();
        pipeline.train("decision_tree").unwrap();
        assert!(pipeline.status().last_training.is_some());

        pipeline.split(0.7).unwrap();
        assert!(pipeline.status().last_training.is_none());
        assert_eq!(pipeline.split_info().unwrap().train_rows, 7);
    }

    #[test]
    fn test_revert_is_idempotent() {
        let mut pipeline = loaded();
        pipeline.revert_preprocess();
        pipeline.revert_preprocess();
        assert!(!pipeline.status().processed);
    }
}
