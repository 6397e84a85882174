//! Bootstrap significance test for model-vs-baseline comparison
//!
//! Resamples the evaluation rows with replacement and measures the error
//! delta (model minus baseline) on each resample. Negative deltas mean the
//! model is better. Each resample index seeds its own generator, so results
//! are reproducible and independent of the parallel execution order.

use crate::config::{BootstrapConfig, TaskType};
use crate::error::{Result, VeritrainError};
use crate::evaluation::metrics::error_metric;
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of a bootstrap comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapResult {
    /// Mean error delta across resamples (model error minus baseline error)
    pub delta_mean: f64,
    /// 2.5th and 97.5th percentiles of the delta distribution
    pub ci95: (f64, f64),
    /// Two-sided p-value for "the delta is zero"
    pub p_value: f64,
    pub n_resamples: usize,
}

impl BootstrapResult {
    /// True when the 95% interval excludes zero and the model's error is
    /// lower.
    pub fn model_significantly_better(&self) -> bool {
        self.ci95.1 < 0.0
    }
}

/// Linear-interpolated percentile of a sorted slice, q in [0, 100].
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Two-sided sign p-value over the delta distribution. Exact zeros fall in
/// neither tail; an all-zero distribution (identical predictions) reports
/// p = 1.0.
fn two_sided_p(deltas: &[f64]) -> f64 {
    let n = deltas.len() as f64;
    let above = deltas.iter().filter(|&&d| d > 0.0).count() as f64;
    let below = deltas.iter().filter(|&&d| d < 0.0).count() as f64;
    if above == 0.0 && below == 0.0 {
        return 1.0;
    }
    (2.0 * (above / n).min(below / n)).min(1.0)
}

/// Compare model and baseline predictions over the same evaluation rows.
pub fn bootstrap_compare(
    y_true: &Array1<f64>,
    model_pred: &Array1<f64>,
    baseline_pred: &Array1<f64>,
    task: TaskType,
    config: &BootstrapConfig,
) -> Result<BootstrapResult> {
    if config.n_resamples == 0 {
        return Err(VeritrainError::ConfigError(
            "bootstrap needs at least one resample".to_string(),
        ));
    }
    let n = y_true.len();
    if n == 0 {
        return Err(VeritrainError::InsufficientData(
            "bootstrap needs at least one evaluation row".to_string(),
        ));
    }
    if model_pred.len() != n || baseline_pred.len() != n {
        return Err(VeritrainError::DataError(format!(
            "prediction length mismatch: {} rows, model {}, baseline {}",
            n,
            model_pred.len(),
            baseline_pred.len()
        )));
    }

    let mut deltas: Vec<f64> = (0..config.n_resamples)
        .into_par_iter()
        .map(|resample| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(resample as u64));
            let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

            let yt = Array1::from_iter(indices.iter().map(|&i| y_true[i]));
            let ym = Array1::from_iter(indices.iter().map(|&i| model_pred[i]));
            let yb = Array1::from_iter(indices.iter().map(|&i| baseline_pred[i]));

            error_metric(task, &yt, &ym) - error_metric(task, &yt, &yb)
        })
        .collect();

    let delta_mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    let p_value = two_sided_p(&deltas);
    deltas.sort_by(|a, b| a.total_cmp(b));
    let ci95 = (percentile(&deltas, 2.5), percentile(&deltas, 97.5));

    Ok(BootstrapResult {
        delta_mean,
        ci95,
        p_value,
        n_resamples: config.n_resamples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n_resamples: usize, seed: u64) -> BootstrapConfig {
        BootstrapConfig {
            enabled: true,
            n_resamples,
            seed,
        }
    }

    #[test]
    fn test_same_seed_is_identical() {
        let y = Array1::from_shape_fn(50, |i| (i % 2) as f64);
        let model = Array1::from_shape_fn(50, |i| if i % 10 == 0 { 1.0 } else { (i % 2) as f64 });
        let baseline = Array1::zeros(50);

        let a = bootstrap_compare(&y, &model, &baseline, TaskType::Classification, &config(100, 7))
            .unwrap();
        let b = bootstrap_compare(&y, &model, &baseline, TaskType::Classification, &config(100, 7))
            .unwrap();
        assert_eq!(a.delta_mean, b.delta_mean);
        assert_eq!(a.ci95, b.ci95);
        assert_eq!(a.p_value, b.p_value);
    }

    #[test]
    fn test_strictly_better_model_is_significant() {
        // Model is always right, baseline always wrong.
        let y = Array1::from_shape_fn(60, |i| (i % 2) as f64);
        let model = y.clone();
        let baseline = y.mapv(|v| 1.0 - v);

        let result =
            bootstrap_compare(&y, &model, &baseline, TaskType::Classification, &config(200, 42))
                .unwrap();
        assert!(result.delta_mean < 0.0);
        assert!(result.model_significantly_better());
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_identical_predictions_p_is_one() {
        let y = Array1::from_shape_fn(40, |i| (i % 2) as f64);
        let pred = y.clone();
        let result =
            bootstrap_compare(&y, &pred, &pred, TaskType::Classification, &config(50, 1)).unwrap();
        assert_eq!(result.delta_mean, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(!result.model_significantly_better());
    }

    #[test]
    fn test_zero_resamples_is_an_error() {
        let y = Array1::from_shape_fn(10, |i| (i % 2) as f64);
        assert!(matches!(
            bootstrap_compare(&y, &y, &y, TaskType::Classification, &config(0, 42)),
            Err(VeritrainError::ConfigError(_))
        ));
    }

    #[test]
    fn test_empty_rows_fail() {
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(
            bootstrap_compare(
                &empty,
                &empty,
                &empty,
                TaskType::Regression,
                &config(10, 0)
            ),
            Err(VeritrainError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(percentile(&sorted, 0.0), 0.0);
        assert_eq!(percentile(&sorted, 100.0), 3.0);
        assert!((percentile(&sorted, 50.0) - 1.5).abs() < 1e-12);
    }
}
