//! Gradient-descent linear models
//!
//! Both models expect standardized features (the preprocessor guarantees
//! this) so a fixed learning rate converges without line search.

use crate::error::{Result, VeritrainError};
use crate::model::Estimator;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Binary logistic regression with L2 regularization.
///
/// Labels must be 0.0 / 1.0. With `balanced_class_weights` enabled, each
/// sample is weighted by `n / (2 * n_class)` so the minority class
/// contributes equally to the gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    alpha: f64,
    learning_rate: f64,
    max_iter: usize,
    tol: f64,
    balanced_class_weights: bool,
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            alpha: 0.01,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
            balanced_class_weights: false,
        }
    }

    pub fn with_balanced_class_weights(mut self, balanced: bool) -> Self {
        self.balanced_class_weights = balanced;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    /// Per-sample weights under the balanced scheme. Falls back to uniform
    /// weights when only one class is present.
    fn sample_weights(&self, y: &Array1<f64>) -> Array1<f64> {
        if !self.balanced_class_weights {
            return Array1::ones(y.len());
        }
        let n = y.len() as f64;
        let n_pos = y.iter().filter(|&&v| v >= 0.5).count() as f64;
        let n_neg = n - n_pos;
        if n_pos == 0.0 || n_neg == 0.0 {
            return Array1::ones(y.len());
        }
        let w_pos = n / (2.0 * n_pos);
        let w_neg = n / (2.0 * n_neg);
        y.mapv(|v| if v >= 0.5 { w_pos } else { w_neg })
    }

    fn scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coef = self
            .coefficients
            .as_ref()
            .ok_or(VeritrainError::NotFitted("LogisticRegression"))?;
        if x.ncols() != coef.len() {
            return Err(VeritrainError::DataError(format!(
                "feature count mismatch: model has {} features, input has {}",
                coef.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(coef) + self.intercept)
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(VeritrainError::DataError(format!(
                "shape mismatch: x has {} rows, y has {} values",
                n,
                y.len()
            )));
        }

        let sample_weights = self.sample_weights(y);
        let mut coef = Array1::<f64>::zeros(x.ncols());
        let mut intercept = 0.0;

        for iter in 0..self.max_iter {
            let z = x.dot(&coef) + intercept;
            let residual = (z.mapv(Self::sigmoid) - y) * &sample_weights;

            let grad_coef = x.t().dot(&residual) / n as f64 + self.alpha * &coef;
            let grad_intercept = residual.sum() / n as f64;

            coef.scaled_add(-self.learning_rate, &grad_coef);
            intercept -= self.learning_rate * grad_intercept;

            let grad_norm = grad_coef.dot(&grad_coef).sqrt() + grad_intercept.abs();
            if grad_norm < self.tol {
                debug!(iter, "logistic regression converged");
                break;
            }
        }

        self.coefficients = Some(coef);
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.scores(x)?;
        Ok(scores.mapv(|z| if Self::sigmoid(z) >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        let p = self.scores(x)?.mapv(Self::sigmoid);
        let mut proba = Array2::<f64>::zeros((x.nrows(), 2));
        for (i, &p_i) in p.iter().enumerate() {
            proba[[i, 0]] = 1.0 - p_i;
            proba[[i, 1]] = p_i;
        }
        Ok(Some(proba))
    }
}

/// Ordinary least squares fitted by gradient descent, with optional L2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    alpha: f64,
    learning_rate: f64,
    max_iter: usize,
    tol: f64,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            alpha: 0.0,
            learning_rate: 0.05,
            max_iter: 2000,
            tol: 1e-8,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(VeritrainError::DataError(format!(
                "shape mismatch: x has {} rows, y has {} values",
                n,
                y.len()
            )));
        }

        let mut coef = Array1::<f64>::zeros(x.ncols());
        // Starting the intercept at the target mean speeds up convergence
        // since features are centered.
        let mut intercept = y.sum() / n as f64;

        for iter in 0..self.max_iter {
            let residual = x.dot(&coef) + intercept - y;

            let grad_coef = x.t().dot(&residual) * (2.0 / n as f64) + self.alpha * &coef;
            let grad_intercept = residual.sum() * (2.0 / n as f64);

            coef.scaled_add(-self.learning_rate, &grad_coef);
            intercept -= self.learning_rate * grad_intercept;

            let grad_norm = grad_coef.dot(&grad_coef).sqrt() + grad_intercept.abs();
            if grad_norm < self.tol {
                debug!(iter, "linear regression converged");
                break;
            }
        }

        self.coefficients = Some(coef);
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coef = self
            .coefficients
            .as_ref()
            .ok_or(VeritrainError::NotFitted("LinearRegression"))?;
        if x.ncols() != coef.len() {
            return Err(VeritrainError::DataError(format!(
                "feature count mismatch: model has {} features, input has {}",
                coef.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(coef) + self.intercept)
    }
}
