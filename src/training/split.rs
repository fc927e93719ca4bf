//! Seeded train/test partitioning

use crate::error::{PipelineError, Result};
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Seed used for every split so that a ratio always reproduces its partition
pub const DEFAULT_SEED: u64 = 42;

/// Smallest accepted train fraction
pub const MIN_RATIO: f64 = 0.5;
/// Largest accepted train fraction
pub const MAX_RATIO: f64 = 0.9;

/// Which table the split's features were taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Raw,
    Processed,
}

/// Row indices of the two partitions, in shuffled order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Features and labels split into train and test partitions
#[derive(Debug, Clone)]
pub struct SplitSet {
    pub ratio: f64,
    pub source: SourceKind,
    pub feature_names: Vec<String>,
    pub partition: Partition,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<Option<String>>,
    pub y_test: Vec<Option<String>>,
}

impl SplitSet {
    pub fn train_rows(&self) -> usize {
        self.x_train.nrows()
    }

    pub fn test_rows(&self) -> usize {
        self.x_test.nrows()
    }

    pub fn total_rows(&self) -> usize {
        self.train_rows() + self.test_rows()
    }
}

/// Shuffles row indices with a fixed seed and cuts them at `ratio`
#[derive(Debug, Clone)]
pub struct TrainTestSplitter {
    ratio: f64,
    seed: u64,
}

impl TrainTestSplitter {
    /// Fails with `InvalidRatio` unless `MIN_RATIO <= ratio <= MAX_RATIO`
    pub fn new(ratio: f64) -> Result<Self> {
        if !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
            return Err(PipelineError::InvalidRatio {
                ratio,
                reason: format!("must be between {} and {}", MIN_RATIO, MAX_RATIO),
            });
        }
        Ok(Self {
            ratio,
            seed: DEFAULT_SEED,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Number of rows that land in the train partition for `n_rows`
    pub fn train_size(&self, n_rows: usize) -> usize {
        // tolerance keeps 0.7 * 100 from flooring to 69
        ((self.ratio * n_rows as f64) + 1e-9).floor() as usize
    }

    /// Shuffle `0..n_rows` and cut at the train size.
    ///
    /// Both partitions must be non-empty.
    pub fn partition(&self, n_rows: usize) -> Result<Partition> {
        let n_train = self.train_size(n_rows);
        if n_train == 0 || n_train >= n_rows {
            return Err(PipelineError::InvalidRatio {
                ratio: self.ratio,
                reason: format!("leaves an empty partition for {} rows", n_rows),
            });
        }

        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let test = indices.split_off(n_train);
        Ok(Partition {
            train: indices,
            test,
        })
    }

    /// Partition a feature matrix and its labels
    pub fn split(
        &self,
        x: &Array2<f64>,
        y: &[Option<String>],
        feature_names: Vec<String>,
        source: SourceKind,
    ) -> Result<SplitSet> {
        if x.nrows() != y.len() {
            return Err(PipelineError::RowCountMismatch {
                features: x.nrows(),
                target: y.len(),
            });
        }

        let partition = self.partition(x.nrows())?;
        let pick = |idx: &[usize]| idx.iter().map(|&i| y[i].clone()).collect::<Vec<_>>();

        Ok(SplitSet {
            ratio: self.ratio,
            source,
            feature_names,
            x_train: x.select(Axis(0), &partition.train),
            x_test: x.select(Axis(0), &partition.test),
            y_train: pick(&partition.train),
            y_test: pick(&partition.test),
            partition,
        })
    }
}
