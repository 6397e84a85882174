//! K-fold cross-validation splitters
//!
//! Folds are built from shuffled row indices with a seeded generator, so a
//! fixed seed reproduces the exact fold assignment.

use crate::error::{Result, VeritrainError};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One fold: indices to fit on and indices to score on.
pub type Fold = (Vec<usize>, Vec<usize>);

fn folds_from_assignment(assignment: &[Vec<usize>]) -> Vec<Fold> {
    (0..assignment.len())
        .map(|fold| {
            let mut train: Vec<usize> = Vec::new();
            for (other, indices) in assignment.iter().enumerate() {
                if other != fold {
                    train.extend(indices);
                }
            }
            let mut test = assignment[fold].clone();
            train.sort_unstable();
            test.sort_unstable();
            (train, test)
        })
        .collect()
}

/// Plain k-fold over shuffled indices, for regression targets.
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        if n_samples < self.n_splits {
            return Err(VeritrainError::InsufficientData(format!(
                "{} samples cannot fill {} folds",
                n_samples, self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let mut assignment = vec![Vec::new(); self.n_splits];
        for (pos, idx) in indices.into_iter().enumerate() {
            assignment[pos % self.n_splits].push(idx);
        }
        Ok(folds_from_assignment(&assignment))
    }
}

/// Stratified k-fold: each fold keeps the class proportions of the whole
/// target, up to rounding.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<Fold>> {
        let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &v) in y.iter().enumerate() {
            groups.entry(v.round() as i64).or_default().push(i);
        }

        for (label, indices) in &groups {
            if indices.len() < self.n_splits {
                return Err(VeritrainError::InsufficientData(format!(
                    "class {} has {} samples, fewer than {} folds",
                    label,
                    indices.len(),
                    self.n_splits
                )));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut assignment = vec![Vec::new(); self.n_splits];
        for indices in groups.values() {
            let mut shuffled = indices.clone();
            shuffled.shuffle(&mut rng);
            // Round-robin within each class keeps fold class ratios even.
            for (pos, idx) in shuffled.into_iter().enumerate() {
                assignment[pos % self.n_splits].push(idx);
            }
        }
        Ok(folds_from_assignment(&assignment))
    }
}

/// Aggregated cross-validation scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvReport {
    pub metric: String,
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CvReport {
    pub fn from_scores(metric: impl Into<String>, scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;
        Self {
            metric: metric.into(),
            scores,
            mean,
            std: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_of(y: &Array1<f64>, idx: usize) -> i64 {
        y[idx].round() as i64
    }

    #[test]
    fn test_stratified_folds_partition_all_rows() {
        let y = Array1::from_shape_fn(20, |i| if i < 12 { 0.0 } else { 1.0 });
        let folds = StratifiedKFold::new(4, 42).split(&y).unwrap();
        assert_eq!(folds.len(), 4);

        let mut seen: Vec<usize> = Vec::new();
        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 20);
            for idx in test {
                assert!(!train.contains(idx));
            }
            seen.extend(test);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_stratified_folds_keep_class_ratio() {
        let y = Array1::from_shape_fn(40, |i| if i < 30 { 0.0 } else { 1.0 });
        let folds = StratifiedKFold::new(5, 42).split(&y).unwrap();
        for (_, test) in &folds {
            let minority = test.iter().filter(|&&i| class_of(&y, i) == 1).count();
            assert_eq!(minority, 2);
            assert_eq!(test.len(), 8);
        }
    }

    #[test]
    fn test_stratified_rejects_sparse_class() {
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        let result = StratifiedKFold::new(3, 42).split(&y);
        assert!(matches!(
            result,
            Err(VeritrainError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_stratified_deterministic() {
        let y = Array1::from_shape_fn(30, |i| (i % 2) as f64);
        let a = StratifiedKFold::new(3, 9).split(&y).unwrap();
        let b = StratifiedKFold::new(3, 9).split(&y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kfold_partition() {
        let folds = KFold::new(3, 42).split(10).unwrap();
        let mut seen: Vec<usize> = folds.iter().flat_map(|(_, t)| t.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_cv_report_statistics() {
        let report = CvReport::from_scores("f1", vec![0.8, 0.9, 1.0]);
        assert!((report.mean - 0.9).abs() < 1e-12);
        assert!(report.std > 0.0);
    }
}
