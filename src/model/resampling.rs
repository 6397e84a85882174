//! Class-imbalance resampling wrapper
//!
//! Wraps a base estimator and rebalances the training data before
//! delegating to it. Resampling touches only the rows passed to `fit`;
//! prediction paths are pass-through, so evaluation data is never
//! resampled.

use crate::config::ResamplingStrategy;
use crate::error::{Result, VeritrainError};
use crate::model::{BaseEstimator, Estimator};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
#[cfg(feature = "smote")]
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[cfg(feature = "smote")]
const SMOTE_NEIGHBORS: usize = 5;

/// Estimator decorator applying a resampling strategy at fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResamplingEstimator {
    strategy: ResamplingStrategy,
    base: BaseEstimator,
    seed: u64,
    is_fitted: bool,
}

impl ResamplingEstimator {
    pub fn new(base: BaseEstimator, strategy: ResamplingStrategy, seed: u64) -> Self {
        Self {
            strategy,
            base,
            seed,
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> ResamplingStrategy {
        self.strategy
    }
}

impl Estimator for ResamplingEstimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self.strategy {
            // ClassWeight rebalances inside the base estimator's loss,
            // not in the data.
            ResamplingStrategy::None | ResamplingStrategy::ClassWeight => {
                self.base.fit(x, y)?;
            }
            ResamplingStrategy::Undersample => {
                let (xr, yr) = undersample(x, y, self.seed)?;
                info!(
                    original = x.nrows(),
                    resampled = xr.nrows(),
                    "undersampled majority classes"
                );
                self.base.fit(&xr, &yr)?;
            }
            #[cfg(feature = "smote")]
            ResamplingStrategy::Oversample => {
                let (xr, yr) = smote_oversample(x, y, self.seed)?;
                info!(
                    original = x.nrows(),
                    resampled = xr.nrows(),
                    "oversampled minority classes"
                );
                self.base.fit(&xr, &yr)?;
            }
            #[cfg(not(feature = "smote"))]
            ResamplingStrategy::Oversample => {
                tracing::warn!("oversampling support not compiled in, fitting without resampling");
                self.base.fit(x, y)?;
            }
        }
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(VeritrainError::NotFitted("ResamplingEstimator"));
        }
        self.base.predict(x)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        if !self.is_fitted {
            return Err(VeritrainError::NotFitted("ResamplingEstimator"));
        }
        self.base.predict_proba(x)
    }
}

/// Row indices per rounded class label, keyed in ascending label order.
fn class_indices(y: &Array1<f64>) -> Result<BTreeMap<i64, Vec<usize>>> {
    if y.is_empty() {
        return Err(VeritrainError::InsufficientData(
            "cannot resample an empty training set".to_string(),
        ));
    }
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &v) in y.iter().enumerate() {
        groups.entry(v.round() as i64).or_default().push(i);
    }
    Ok(groups)
}

fn select_rows(x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
    let xr = x.select(Axis(0), indices);
    let yr = Array1::from_iter(indices.iter().map(|&i| y[i]));
    (xr, yr)
}

/// Randomly truncate every class to the minority count. Kept rows stay in
/// their original order so repeated runs with one seed are identical.
fn undersample(
    x: &Array2<f64>,
    y: &Array1<f64>,
    seed: u64,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let groups = class_indices(y)?;
    let min_count = groups.values().map(Vec::len).min().unwrap_or(0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut keep: Vec<usize> = Vec::with_capacity(min_count * groups.len());
    for indices in groups.values() {
        let mut shuffled = indices.clone();
        shuffled.shuffle(&mut rng);
        shuffled.truncate(min_count);
        keep.extend(shuffled);
    }
    keep.sort_unstable();

    Ok(select_rows(x, y, &keep))
}

/// SMOTE oversampling: every minority class is grown to the majority count
/// with synthetic rows interpolated between a class member and one of its
/// nearest neighbors within the class.
#[cfg(feature = "smote")]
fn smote_oversample(
    x: &Array2<f64>,
    y: &Array1<f64>,
    seed: u64,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let groups = class_indices(y)?;
    let max_count = groups.values().map(Vec::len).max().unwrap_or(0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut synthetic_rows: Vec<Array1<f64>> = Vec::new();
    let mut synthetic_labels: Vec<f64> = Vec::new();

    for (&label, indices) in &groups {
        let deficit = max_count - indices.len();
        if deficit == 0 {
            continue;
        }

        for _ in 0..deficit {
            let &anchor = indices
                .get(rng.gen_range(0..indices.len()))
                .ok_or_else(|| VeritrainError::InsufficientData("empty class group".to_string()))?;
            let anchor_row = x.row(anchor);

            if indices.len() < 2 {
                // A lone sample has no neighbor to interpolate toward;
                // duplicate it instead.
                synthetic_rows.push(anchor_row.to_owned());
                synthetic_labels.push(label as f64);
                continue;
            }

            // k nearest same-class neighbors of the anchor, self excluded
            let mut dists: Vec<(f64, usize)> = indices
                .iter()
                .filter(|&&i| i != anchor)
                .map(|&i| {
                    let d = x
                        .row(i)
                        .iter()
                        .zip(anchor_row.iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>();
                    (d, i)
                })
                .collect();
            dists.sort_by(|a, b| a.0.total_cmp(&b.0));
            let k = SMOTE_NEIGHBORS.min(dists.len());
            let (_, neighbor) = dists[rng.gen_range(0..k)];

            let gap: f64 = rng.gen_range(0.0..1.0);
            let neighbor_row = x.row(neighbor);
            let synthetic = Array1::from_iter(
                anchor_row
                    .iter()
                    .zip(neighbor_row.iter())
                    .map(|(a, b)| a + gap * (b - a)),
            );
            synthetic_rows.push(synthetic);
            synthetic_labels.push(label as f64);
        }
    }

    if synthetic_rows.is_empty() {
        return Ok((x.clone(), y.clone()));
    }

    let mut xr = Array2::<f64>::zeros((x.nrows() + synthetic_rows.len(), x.ncols()));
    xr.slice_mut(ndarray::s![..x.nrows(), ..]).assign(x);
    for (offset, row) in synthetic_rows.iter().enumerate() {
        xr.row_mut(x.nrows() + offset).assign(row);
    }
    let yr = Array1::from_iter(y.iter().copied().chain(synthetic_labels));

    Ok((xr, yr))
}
