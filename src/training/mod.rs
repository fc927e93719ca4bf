//! Model training module
//!
//! Provides the train stage of the pipeline:
//! - Seeded train/test partitioning
//! - Label encoding of the target column
//! - Decision tree and multinomial logistic regression classifiers
//! - Accuracy scoring on both partitions

mod decision_tree;
mod labels;
mod logistic;
mod models;
pub mod split;

pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use labels::LabelEncoder;
pub use logistic::LogisticRegression;
pub use models::{accuracy, Classifier, Model, ModelKind};
pub use split::{Partition, SourceKind, SplitSet, TrainTestSplitter};

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use std::time::Instant;
use tracing::{debug, info};

/// Result of fitting one model on a split
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: ModelKind,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub n_classes: usize,
    /// Labelled rows actually used from each partition
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fit `kind` on the train partition and score it on both partitions.
///
/// Rows whose target is missing are left out of fitting and scoring.
pub fn train_and_score(kind: ModelKind, split: &SplitSet) -> Result<TrainingOutcome> {
    let start = Instant::now();
    let encoder = LabelEncoder::fit(split.y_train.iter().chain(split.y_test.iter()));

    let (x_train, y_train) = labelled_rows(&encoder, &split.x_train, &split.y_train);
    let (x_test, y_test) = labelled_rows(&encoder, &split.x_test, &split.y_test);

    if y_train.is_empty() {
        return Err(PipelineError::InvalidTarget(
            "no labelled rows in the training partition".to_string(),
        ));
    }
    debug!(
        model = %kind,
        classes = encoder.n_classes(),
        train_rows = y_train.len(),
        test_rows = y_test.len(),
        "Fitting model"
    );

    let mut model = kind.build();
    model.fit(&x_train, &y_train)?;

    let train_accuracy = accuracy(&y_train, &model.predict(&x_train)?);
    let test_accuracy = if y_test.is_empty() {
        0.0
    } else {
        accuracy(&y_test, &model.predict(&x_test)?)
    };

    match &model {
        Model::DecisionTree(tree) => {
            info!(depth = tree.depth(), leaves = tree.n_leaves(), "Decision tree grown")
        }
        Model::LogisticRegression(lr) => info!(iterations = lr.n_iter(), "Logistic regression fitted"),
    }
    info!(
        model = %kind,
        train_accuracy,
        test_accuracy,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Training complete"
    );

    Ok(TrainingOutcome {
        model: kind,
        train_accuracy,
        test_accuracy,
        n_classes: encoder.n_classes(),
        train_rows: y_train.len(),
        test_rows: y_test.len(),
    })
}

fn labelled_rows(
    encoder: &LabelEncoder,
    x: &Array2<f64>,
    labels: &[Option<String>],
) -> (Array2<f64>, Array1<f64>) {
    let (rows, y) = encoder.encode_labelled(labels);
    (x.select(Axis(0), &rows), y)
}
