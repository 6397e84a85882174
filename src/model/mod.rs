//! Estimators and model wrappers
//!
//! The capability surface is the [`Estimator`] trait: exactly `fit`,
//! `predict`, and `predict_proba`. The resampling wrapper composes a base
//! estimator and is itself an `Estimator`.

mod baseline;
mod linear;
mod resampling;

pub use baseline::{Baseline, MajorityClassBaseline, MedianBaseline};
pub use linear::{LinearRegression, LogisticRegression};
pub use resampling::ResamplingEstimator;

use crate::config::TaskType;
use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Capability interface for trainable models.
pub trait Estimator: Send + Sync {
    /// Fit the model to a feature matrix and target vector
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict targets (class labels for classifiers)
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Predict class probabilities, one column per class.
    /// Returns `None` for estimators without probability scores.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        let _ = x;
        Ok(None)
    }
}

/// Closed set of base estimators the trainer can fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BaseEstimator {
    Logistic(LogisticRegression),
    Linear(LinearRegression),
}

impl BaseEstimator {
    /// Default estimator for a task. `balanced` enables balanced class
    /// weighting on the classifier (the `class_weight` resampling strategy);
    /// it has no effect on regression.
    pub fn for_task(task: TaskType, balanced: bool) -> Self {
        match task {
            TaskType::Classification => {
                Self::Logistic(LogisticRegression::new().with_balanced_class_weights(balanced))
            }
            TaskType::Regression => Self::Linear(LinearRegression::new()),
        }
    }
}

impl Estimator for BaseEstimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Self::Logistic(m) => m.fit(x, y),
            Self::Linear(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Self::Logistic(m) => m.predict(x),
            Self::Linear(m) => m.predict(x),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        match self {
            Self::Logistic(m) => m.predict_proba(x),
            Self::Linear(m) => m.predict_proba(x),
        }
    }
}
