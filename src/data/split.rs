//! Train/validation/test partitioning
//!
//! Two-stage split: the test fraction is peeled off first, then the
//! validation fraction is peeled off the remainder. Splitting is
//! deterministic given a seed, and stratified by target class for
//! classification tasks.

use crate::config::{PipelineConfig, TaskType};
use crate::data::{take_rows, target_values};
use crate::error::{Result, VeritrainError};
use polars::prelude::DataFrame;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Row-id partitions of one dataset.
///
/// Invariant: the three sets are pairwise disjoint and their union is the
/// full row-id set. Each list is stored sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Persist the partition for reproducibility audits.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Produces train/val/test partitions with the preprocessing leakage
/// guarantee: downstream fit steps only ever see the `train` frame.
#[derive(Debug, Clone)]
pub struct SplitOrchestrator {
    task: TaskType,
    test_size: f64,
    val_size: f64,
    seed: u64,
}

impl SplitOrchestrator {
    pub fn new(task: TaskType, test_size: f64, val_size: f64, seed: u64) -> Self {
        Self {
            task,
            test_size,
            val_size,
            seed,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.task, config.test_size, config.val_size, config.seed)
    }

    /// Split a table into (train, val, test) frames plus the index partition.
    pub fn split(
        &self,
        df: &DataFrame,
        target_column: &str,
    ) -> Result<(DataFrame, DataFrame, DataFrame, SplitIndices)> {
        let n = df.height();
        if n < 3 {
            return Err(VeritrainError::InsufficientData(format!(
                "need at least 3 rows to split, got {n}"
            )));
        }

        let y = target_values(df, target_column)?;
        let all: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // Stage 1: peel off the test fraction.
        let (remainder, mut test) = self.peel(&all, &y, self.test_size, &mut rng);

        // Stage 2: peel validation off the remainder, rescaled so the
        // validation fraction refers to the full table.
        let val_rel = self.val_size / (1.0 - self.test_size);
        let (mut train, mut val) = self.peel(&remainder, &y, val_rel, &mut rng);

        train.sort_unstable();
        val.sort_unstable();
        test.sort_unstable();

        info!(
            train = train.len(),
            val = val.len(),
            test = test.len(),
            seed = self.seed,
            "split dataset"
        );

        let train_df = take_rows(df, &train)?;
        let val_df = take_rows(df, &val)?;
        let test_df = take_rows(df, &test)?;

        Ok((train_df, val_df, test_df, SplitIndices { train, val, test }))
    }

    /// Split `pool` into (kept, peeled) where the peeled part is `fraction`
    /// of the pool, stratified by class for classification tasks.
    fn peel(
        &self,
        pool: &[usize],
        y: &ndarray::Array1<f64>,
        fraction: f64,
        rng: &mut ChaCha8Rng,
    ) -> (Vec<usize>, Vec<usize>) {
        match self.task {
            TaskType::Classification => self.peel_stratified(pool, y, fraction, rng),
            TaskType::Regression => self.peel_shuffled(pool, fraction, rng),
        }
    }

    fn peel_shuffled(
        &self,
        pool: &[usize],
        fraction: f64,
        rng: &mut ChaCha8Rng,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut shuffled = pool.to_vec();
        shuffled.shuffle(rng);
        let n_peel = ((pool.len() as f64) * fraction).round() as usize;
        let n_peel = n_peel.min(pool.len().saturating_sub(1)).max(1);
        let peeled = shuffled.split_off(shuffled.len() - n_peel);
        (shuffled, peeled)
    }

    fn peel_stratified(
        &self,
        pool: &[usize],
        y: &ndarray::Array1<f64>,
        fraction: f64,
        rng: &mut ChaCha8Rng,
    ) -> (Vec<usize>, Vec<usize>) {
        // BTreeMap keeps class iteration order deterministic.
        let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for &row in pool {
            by_class.entry(y[row].round() as i64).or_default().push(row);
        }

        let mut kept = Vec::with_capacity(pool.len());
        let mut peeled = Vec::new();

        for (_, mut rows) in by_class {
            rows.shuffle(rng);
            let n_peel = ((rows.len() as f64) * fraction).round() as usize;
            let n_peel = n_peel.min(rows.len());
            let class_peeled = rows.split_off(rows.len() - n_peel);
            kept.extend(rows);
            peeled.extend(class_peeled);
        }

        (kept, peeled)
    }
}
