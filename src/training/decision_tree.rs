//! Decision tree classifier

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

/// Decision tree node, stored in the tree's node arena
#[derive(Debug, Clone)]
pub enum TreeNode {
    /// Leaf node with predicted class
    Leaf { class: usize, n_samples: usize },
    /// Internal node: `x[feature_idx] <= threshold` goes to arena index `left`
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Gini,
    Entropy,
}

/// CART classifier over class indices `0..n_classes` stored as `f64`.
///
/// Grows until leaves are pure or no threshold separates the remaining
/// rows unless `max_depth` is set. Split search is deterministic: ties
/// go to the lowest feature index and then the lowest threshold.
///
/// Nodes live in a flat arena (root at index 0, children always after
/// their parent), and building, prediction and inspection all walk it
/// iteratively, so tree depth is bounded by memory rather than stack.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub criterion: Criterion,
    n_features: usize,
    n_classes: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Best threshold found for one feature
#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// A node still waiting to be grown
struct PendingNode {
    node: usize,
    depth: usize,
    rows: Vec<usize>,
    /// `rows` ordered by each feature's value
    sorted: Vec<Vec<usize>>,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
            n_features: 0,
            n_classes: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(PipelineError::RowCountMismatch {
                features: n_samples,
                target: y.len(),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::Processing("cannot fit a tree on zero rows".to_string()));
        }

        self.n_features = x.ncols();
        self.n_classes = y.iter().fold(0usize, |acc, &c| acc.max(c as usize + 1));

        let classes: Vec<usize> = y.iter().map(|&c| c as usize).collect();
        self.nodes = self.build_tree(x, &classes);
        Ok(self)
    }

    fn build_tree(&self, x: &Array2<f64>, y: &[usize]) -> Vec<TreeNode> {
        let n_samples = x.nrows();
        // Stable sort keeps equal values in row order
        let sorted: Vec<Vec<usize>> = (0..self.n_features)
            .into_par_iter()
            .map(|feature_idx| {
                let mut order: Vec<usize> = (0..n_samples).collect();
                order.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));
                order
            })
            .collect();

        let mut nodes = vec![TreeNode::Leaf { class: 0, n_samples }];
        let mut pending = vec![PendingNode {
            node: 0,
            depth: 0,
            rows: (0..n_samples).collect(),
            sorted,
        }];

        while let Some(task) = pending.pop() {
            let n_samples = task.rows.len();
            let counts = self.class_counts(y, &task.rows);
            let impurity = self.impurity(&counts, n_samples);

            let should_stop = n_samples < self.min_samples_split
                || impurity <= 0.0
                || self.max_depth.map_or(false, |d| task.depth >= d);

            let best = if should_stop {
                None
            } else {
                self.find_best_split(x, y, &task.sorted, &counts, impurity)
            };

            let Some(best) = best else {
                nodes[task.node] = self.leaf(&counts, n_samples);
                continue;
            };

            let goes_left = |i: &usize| x[[*i, best.feature_idx]] <= best.threshold;
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                task.rows.into_iter().partition(goes_left);
            // Midpoint of adjacent floats can round onto one side
            if left_rows.is_empty() || right_rows.is_empty() {
                nodes[task.node] = self.leaf(&counts, n_samples);
                continue;
            }
            let (left_sorted, right_sorted): (Vec<Vec<usize>>, Vec<Vec<usize>>) = task
                .sorted
                .into_iter()
                .map(|order| order.into_iter().partition::<Vec<usize>, _>(goes_left))
                .unzip();

            let left = nodes.len();
            let right = left + 1;
            nodes.push(TreeNode::Leaf { class: 0, n_samples: left_rows.len() });
            nodes.push(TreeNode::Leaf { class: 0, n_samples: right_rows.len() });
            nodes[task.node] = TreeNode::Split {
                feature_idx: best.feature_idx,
                threshold: best.threshold,
                left,
                right,
                n_samples,
                impurity,
            };

            // Left is pushed last so it is grown first
            pending.push(PendingNode {
                node: right,
                depth: task.depth + 1,
                rows: right_rows,
                sorted: right_sorted,
            });
            pending.push(PendingNode {
                node: left,
                depth: task.depth + 1,
                rows: left_rows,
                sorted: left_sorted,
            });
        }

        nodes
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        sorted: &[Vec<usize>],
        counts: &[usize],
        parent_impurity: f64,
    ) -> Option<Candidate> {
        let per_feature: Vec<Option<Candidate>> = sorted
            .par_iter()
            .enumerate()
            .map(|(feature_idx, order)| {
                self.best_threshold(x, y, order, feature_idx, counts, parent_impurity)
            })
            .collect();

        per_feature.into_iter().flatten().fold(None, |best, cand| match best {
            Some(b) if b.gain >= cand.gain - 1e-12 => Some(b),
            _ => Some(cand),
        })
    }

    /// Sweep the rows in feature order, moving them left one at a time
    fn best_threshold(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        order: &[usize],
        feature_idx: usize,
        counts: &[usize],
        parent_impurity: f64,
    ) -> Option<Candidate> {
        let n = order.len();
        let mut left = vec![0usize; self.n_classes];
        let mut right = counts.to_vec();
        let mut best: Option<Candidate> = None;

        for i in 0..n.saturating_sub(1) {
            let row = order[i];
            let class = y[row];
            left[class] += 1;
            right[class] -= 1;

            let value = x[[row, feature_idx]];
            let next = x[[order[i + 1], feature_idx]];
            if next <= value {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let weighted = (n_left as f64 * self.impurity(&left, n_left)
                + n_right as f64 * self.impurity(&right, n_right))
                / n as f64;
            let gain = parent_impurity - weighted;

            if best.map_or(true, |b| gain > b.gain + 1e-12) {
                best = Some(Candidate {
                    feature_idx,
                    threshold: value + (next - value) / 2.0,
                    gain,
                });
            }
        }

        best
    }

    fn class_counts(&self, y: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    fn impurity(&self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        match self.criterion {
            Criterion::Gini => {
                1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
            }
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }

    // Majority class, lowest index on ties
    fn leaf(&self, counts: &[usize], n_samples: usize) -> TreeNode {
        let class = counts
            .iter()
            .enumerate()
            .fold((0usize, 0usize), |(best, best_count), (class, &count)| {
                if count > best_count {
                    (class, count)
                } else {
                    (best, best_count)
                }
            })
            .0;
        TreeNode::Leaf { class, n_samples }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(PipelineError::Processing("decision tree is not fitted".to_string()));
        }

        if x.ncols() != self.n_features {
            return Err(PipelineError::Processing(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| self.predict_sample(row) as f64)
            .collect())
    }

    fn predict_sample(&self, sample: ArrayView1<f64>) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { class, .. } => return *class,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    idx = if sample[*feature_idx] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Longest root-to-leaf path in edges; a lone leaf has depth 0
    pub fn depth(&self) -> usize {
        // Children come after their parent, so one forward pass settles every depth
        let mut depths = vec![0usize; self.nodes.len()];
        let mut deepest = 0;
        for (idx, node) in self.nodes.iter().enumerate() {
            deepest = deepest.max(depths[idx]);
            if let TreeNode::Split { left, right, .. } = node {
                depths[*left] = depths[idx] + 1;
                depths[*right] = depths[idx] + 1;
            }
        }
        deepest
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    /// Arena view of the fitted tree, root first
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }
}
