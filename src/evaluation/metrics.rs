//! Evaluation metrics
//!
//! Classification metrics treat label 1.0 as the positive class.
//! Degenerate denominators (no predicted positives, no actual positives)
//! score 0.0 instead of NaN so reports stay comparable.

use crate::config::TaskType;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

const MAPE_EPS: f64 = 1e-8;

/// Named metric values, ordered by key for stable report output.
pub type MetricsReport = BTreeMap<String, f64>;

pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t.round() == p.round())
        .count();
    correct as f64 / y_true.len() as f64
}

fn confusion(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (f64, f64, f64) {
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut fn_ = 0.0;
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        let t = t.round() as i64;
        let p = p.round() as i64;
        match (t, p) {
            (1, 1) => tp += 1.0,
            (_, 1) => fp += 1.0,
            (1, _) => fn_ += 1.0,
            _ => {}
        }
    }
    (tp, fp, fn_)
}

pub fn precision(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, fp, _) = confusion(y_true, y_pred);
    if tp + fp == 0.0 {
        0.0
    } else {
        tp / (tp + fp)
    }
}

pub fn recall(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, _, fn_) = confusion(y_true, y_pred);
    if tp + fn_ == 0.0 {
        0.0
    } else {
        tp / (tp + fn_)
    }
}

pub fn f1_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let p = precision(y_true, y_pred);
    let r = recall(y_true, y_pred);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Area under the ROC curve from positive-class scores, computed via the
/// rank statistic with tie-averaged ranks.
///
/// Returns `None` when the target holds a single class.
pub fn roc_auc(y_true: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&v| v.round() as i64 == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // Average ranks across tied score groups.
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(t, _)| t.round() as i64 == 1)
        .map(|(_, r)| r)
        .sum();
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>()
        / y_true.len() as f64;
    mse.sqrt()
}

pub fn mae(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Mean absolute percentage error, in percent. The denominator carries a
/// small epsilon so zero targets do not blow up the metric.
pub fn mape(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| ((t - p) / (t + MAPE_EPS)).abs())
        .sum::<f64>()
        / y_true.len() as f64
        * 100.0
}

pub fn r2(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.sum() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Scalar comparison error: classification error rate, or RMSE for
/// regression. Lower is better for both tasks.
pub fn error_metric(task: TaskType, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    match task {
        TaskType::Classification => 1.0 - accuracy(y_true, y_pred),
        TaskType::Regression => rmse(y_true, y_pred),
    }
}

/// Full classification report. The `roc_auc` key is present only when
/// probability scores are supplied and both classes appear in the target.
pub fn classification_metrics(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    proba: Option<&Array2<f64>>,
) -> MetricsReport {
    let mut report = MetricsReport::new();
    report.insert("accuracy".to_string(), accuracy(y_true, y_pred));
    report.insert("precision".to_string(), precision(y_true, y_pred));
    report.insert("recall".to_string(), recall(y_true, y_pred));
    report.insert("f1".to_string(), f1_score(y_true, y_pred));
    if let Some(proba) = proba {
        let scores = proba.column(1).to_owned();
        if let Some(auc) = roc_auc(y_true, &scores) {
            report.insert("roc_auc".to_string(), auc);
        }
    }
    report
}

/// Full regression report.
pub fn regression_metrics(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> MetricsReport {
    let mut report = MetricsReport::new();
    report.insert("rmse".to_string(), rmse(y_true, y_pred));
    report.insert("mae".to_string(), mae(y_true, y_pred));
    report.insert("mape".to_string(), mape(y_true, y_pred));
    report.insert("r2".to_string(), r2(y_true, y_pred));
    report
}
