//! Naive baselines for sanity comparison
//!
//! A trained model that cannot beat these is not extracting signal from the
//! features. The evaluator fits them on train plus validation so they see
//! every row the real model saw.

use crate::config::TaskType;
use crate::error::{Result, VeritrainError};
use crate::model::Estimator;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Predicts the training-set median for every row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianBaseline {
    median: Option<f64>,
}

impl MedianBaseline {
    pub fn new() -> Self {
        Self { median: None }
    }
}

impl Default for MedianBaseline {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for MedianBaseline {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if y.is_empty() {
            return Err(VeritrainError::InsufficientData(
                "cannot take the median of an empty target".to_string(),
            ));
        }
        let mut sorted: Vec<f64> = y.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        self.median = Some(median);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let median = self
            .median
            .ok_or(VeritrainError::NotFitted("MedianBaseline"))?;
        Ok(Array1::from_elem(x.nrows(), median))
    }
}

/// Predicts the most frequent training class for every row.
///
/// When the training target holds a single class the baseline is degenerate:
/// its accuracy says nothing about the problem. The flag is surfaced so
/// reports can mark the comparison as unreliable rather than dropping it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MajorityClassBaseline {
    majority_class: Option<f64>,
    n_classes_seen: usize,
}

impl MajorityClassBaseline {
    pub fn new() -> Self {
        Self {
            majority_class: None,
            n_classes_seen: 0,
        }
    }

    /// True when fit saw fewer than two classes.
    pub fn is_degenerate(&self) -> bool {
        self.n_classes_seen < 2
    }
}

impl Default for MajorityClassBaseline {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for MajorityClassBaseline {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if y.is_empty() {
            return Err(VeritrainError::InsufficientData(
                "cannot find the majority class of an empty target".to_string(),
            ));
        }
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &v in y {
            *counts.entry(v.round() as i64).or_insert(0) += 1;
        }
        // Count ties break to the smaller label.
        let (majority, _) = counts
            .iter()
            .max_by_key(|(label, count)| (**count, std::cmp::Reverse(**label)))
            .ok_or_else(|| {
                VeritrainError::InsufficientData("empty class counts".to_string())
            })?;
        self.majority_class = Some(*majority as f64);
        self.n_classes_seen = counts.len();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let class = self
            .majority_class
            .ok_or(VeritrainError::NotFitted("MajorityClassBaseline"))?;
        Ok(Array1::from_elem(x.nrows(), class))
    }
}

/// Task-dispatched baseline used by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Baseline {
    Median(MedianBaseline),
    Majority(MajorityClassBaseline),
}

impl Baseline {
    pub fn for_task(task: TaskType) -> Self {
        match task {
            TaskType::Classification => Self::Majority(MajorityClassBaseline::new()),
            TaskType::Regression => Self::Median(MedianBaseline::new()),
        }
    }

    /// True when the fitted baseline carries no discriminative information
    /// (single-class classification target). Regression medians are never
    /// degenerate.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Median(_) => false,
            Self::Majority(m) => m.is_degenerate(),
        }
    }
}

impl Estimator for Baseline {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Self::Median(m) => m.fit(x, y),
            Self::Majority(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Self::Median(m) => m.predict(x),
            Self::Majority(m) => m.predict(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_median_even_count() {
        let x = array![[0.0], [0.0], [0.0], [0.0]];
        let y = array![1.0, 2.0, 3.0, 10.0];
        let mut baseline = MedianBaseline::new();
        baseline.fit(&x, &y).unwrap();
        let pred = baseline.predict(&x).unwrap();
        assert_eq!(pred, array![2.5, 2.5, 2.5, 2.5]);
    }

    #[test]
    fn test_majority_class() {
        let x = array![[0.0], [0.0], [0.0], [0.0], [0.0]];
        let y = array![0.0, 1.0, 0.0, 0.0, 1.0];
        let mut baseline = MajorityClassBaseline::new();
        baseline.fit(&x, &y).unwrap();
        assert!(!baseline.is_degenerate());
        let pred = baseline.predict(&x).unwrap();
        assert!(pred.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let x = array![[0.0], [0.0]];
        let y = array![1.0, 1.0];
        let mut baseline = MajorityClassBaseline::new();
        baseline.fit(&x, &y).unwrap();
        assert!(baseline.is_degenerate());
    }

    #[test]
    fn test_empty_target_fails() {
        let x = Array2::<f64>::zeros((0, 1));
        let y = Array1::<f64>::zeros(0);
        let mut baseline = MedianBaseline::new();
        assert!(matches!(
            baseline.fit(&x, &y),
            Err(VeritrainError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_baseline_dispatch() {
        let x = array![[0.0], [0.0], [0.0]];
        let y = array![1.0, 1.0, 0.0];
        let mut baseline = Baseline::for_task(TaskType::Classification);
        baseline.fit(&x, &y).unwrap();
        assert_eq!(baseline.predict(&x).unwrap()[0], 1.0);
        assert!(!baseline.is_degenerate());
    }
}
