//! Multinomial logistic regression

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};

/// Softmax regression fitted by full-batch gradient descent.
///
/// Inputs are centred and scaled internally before fitting, so raw and
/// preprocessed features converge alike. The L2 penalty follows the
/// `C` convention: strength `1 / (C * n_samples)` on the mean loss.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Fitted weights, `n_features x n_classes`
    pub coefficients: Option<Array2<f64>>,
    /// Fitted intercepts, one per class
    pub intercepts: Option<Array1<f64>>,
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this
    pub tol: f64,
    pub learning_rate: f64,
    feature_mean: Array1<f64>,
    feature_scale: Array1<f64>,
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.5,
            feature_mean: Array1::zeros(0),
            feature_scale: Array1::zeros(0),
            n_iter: 0,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Iterations used by the last fit
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Row-wise softmax, shifted by the row max for stability
    fn softmax(logits: &Array2<f64>) -> Array2<f64> {
        let mut probs = logits.clone();
        for mut row in probs.rows_mut() {
            let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        probs
    }

    fn standardize(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.feature_mean) / &self.feature_scale
    }

    /// Fit on class indices `0..k` stored as `f64`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PipelineError::RowCountMismatch {
                features: n_samples,
                target: y.len(),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::Processing(
                "cannot fit logistic regression on zero rows".to_string(),
            ));
        }

        let n_classes = y.iter().fold(0usize, |acc, &c| acc.max(c as usize + 1));

        self.feature_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
        self.feature_scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
        let xs = self.standardize(x);

        let mut targets = Array2::<f64>::zeros((n_samples, n_classes));
        for (i, &c) in y.iter().enumerate() {
            targets[[i, c as usize]] = 1.0;
        }

        let mut weights = Array2::<f64>::zeros((n_features, n_classes));
        let mut bias = Array1::<f64>::zeros(n_classes);
        let alpha = 1.0 / (self.c * n_samples as f64);
        let lr = self.learning_rate;

        self.n_iter = self.max_iter;
        for iter in 0..self.max_iter {
            let logits = xs.dot(&weights) + &bias;
            let errors = Self::softmax(&logits) - &targets;

            let dw = xs.t().dot(&errors) / n_samples as f64 + &weights * alpha;
            let db = errors.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_classes));

            let grad_norm = (dw.mapv(|v| v * v).sum() + db.mapv(|v| v * v).sum()).sqrt();
            if grad_norm < self.tol {
                self.n_iter = iter;
                break;
            }

            weights = weights - dw * lr;
            bias = bias - db * lr;
        }

        self.coefficients = Some(weights);
        self.intercepts = Some(bias);
        Ok(self)
    }

    /// Class probabilities, `n_samples x n_classes`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (weights, bias) = match (&self.coefficients, &self.intercepts) {
            (Some(w), Some(b)) => (w, b),
            _ => {
                return Err(PipelineError::Processing(
                    "logistic regression is not fitted".to_string(),
                ))
            }
        };
        if x.ncols() != weights.nrows() {
            return Err(PipelineError::Processing(format!(
                "expected {} features, got {}",
                weights.nrows(),
                x.ncols()
            )));
        }

        let logits = self.standardize(x).dot(weights) + bias;
        Ok(Self::softmax(&logits))
    }

    /// Most probable class per row, lowest index on ties
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0usize, f64::NEG_INFINITY), |(best, best_p), (c, &p)| {
                        if p > best_p {
                            (c, p)
                        } else {
                            (best, best_p)
                        }
                    })
                    .0 as f64
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_separable() {
        let x = array![[1.0], [2.0], [3.0], [7.0], [8.0], [9.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_three_classes_on_large_scale_inputs() {
        let x = array![
            [1000.0, 1.0],
            [1100.0, 1.5],
            [5000.0, 5.0],
            [5100.0, 5.5],
            [9000.0, 9.0],
            [9100.0, 9.5],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];

        let mut model = LogisticRegression::new().with_c(100.0).with_max_iter(5000);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0]];
        let y = array![0.0, 1.0, 2.0];

        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_class() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 0.0];
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_predict_before_fit() {
        assert!(LogisticRegression::new().predict(&array![[1.0]]).is_err());
    }
}
