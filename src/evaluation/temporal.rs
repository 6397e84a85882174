//! Temporal backtest
//!
//! Random splits overstate performance when data drifts over time. The
//! backtest orders rows by a time-like column, scores the trained pipeline
//! on the chronologically latest tail, then breaks the holdout error down
//! by segment to expose unevenly-served subpopulations.

use crate::config::{PipelineConfig, TaskType};
use crate::data::{take_rows, target_values};
use crate::error::{Result, VeritrainError};
use crate::evaluation::metrics::{
    classification_metrics, error_metric, regression_metrics, MetricsReport,
};
use crate::training::TrainedPipeline;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Holdout error for one segment value of one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentError {
    pub segment_column: String,
    pub segment_value: String,
    pub sample_count: usize,
    /// Error rate for classification, RMSE for regression
    pub error: f64,
}

/// Forward-holdout evaluation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalReport {
    pub ordering_column: String,
    /// Rows chronologically preceding the holdout
    pub n_train: usize,
    pub n_holdout: usize,
    pub metrics: MetricsReport,
    /// Sorted by (column, value); only segments with at least
    /// `min_segment_size` holdout rows appear
    pub segments: Vec<SegmentError>,
}

/// Row order that sorts the frame ascending by the ordering column.
/// Ties keep their original relative order.
fn chronological_order(df: &DataFrame, ordering_column: &str) -> Result<Vec<usize>> {
    let column = df
        .column(ordering_column)
        .map_err(|_| VeritrainError::ColumnNotFound(ordering_column.to_string()))?;
    let casted = column.cast(&DataType::Float64).map_err(|_| {
        VeritrainError::DataError(format!(
            "ordering column '{ordering_column}' is not numeric or castable to numeric"
        ))
    })?;
    let ca = casted
        .f64()
        .map_err(|e| VeritrainError::DataError(e.to_string()))?;

    let mut keyed: Vec<(f64, usize)> = Vec::with_capacity(ca.len());
    for (i, v) in ca.into_iter().enumerate() {
        match v {
            Some(v) => keyed.push((v, i)),
            None => {
                return Err(VeritrainError::DataError(format!(
                    "ordering column '{ordering_column}' has a null at row {i}"
                )))
            }
        }
    }
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, i)| i).collect())
}

fn column_as_strings(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let casted = df.column(name)?.cast(&DataType::String)?;
    let ca = casted
        .str()
        .map_err(|e| VeritrainError::DataError(e.to_string()))?;
    Ok(ca
        .into_iter()
        .map(|v| v.unwrap_or("null").to_string())
        .collect())
}

/// Per-segment holdout error over one column.
fn segment_errors(
    df: &DataFrame,
    column: &str,
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    task: TaskType,
    min_segment_size: usize,
) -> Result<Vec<SegmentError>> {
    let values = column_as_strings(df, column)?;
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, v) in values.iter().enumerate() {
        groups.entry(v).or_default().push(i);
    }

    let mut out = Vec::new();
    for (value, rows) in groups {
        if rows.len() < min_segment_size {
            continue;
        }
        let yt = Array1::from_iter(rows.iter().map(|&i| y_true[i]));
        let yp = Array1::from_iter(rows.iter().map(|&i| y_pred[i]));
        out.push(SegmentError {
            segment_column: column.to_string(),
            segment_value: value.to_string(),
            sample_count: rows.len(),
            error: error_metric(task, &yt, &yp),
        });
    }
    Ok(out)
}

/// Score the trained pipeline on the chronologically latest tail of the
/// table.
///
/// The pipeline's random training partition may contain rows later than
/// parts of the holdout, so this reads as an in-sample drift check rather
/// than a strict forward simulation.
pub fn temporal_backtest(
    pipeline: &TrainedPipeline,
    df: &DataFrame,
    config: &PipelineConfig,
) -> Result<TemporalReport> {
    let ordering_column = config.temporal.ordering_column.as_deref().ok_or_else(|| {
        VeritrainError::ConfigError(
            "temporal backtest requires temporal.ordering_column".to_string(),
        )
    })?;

    let n = df.height();
    if n < 2 {
        return Err(VeritrainError::InsufficientData(format!(
            "temporal backtest needs at least 2 rows, got {n}"
        )));
    }
    let n_holdout = ((n as f64 * config.temporal.test_size) as usize).max(1);
    if n_holdout >= n {
        return Err(VeritrainError::InsufficientData(format!(
            "temporal holdout of {n_holdout} rows leaves no training data"
        )));
    }

    let order = chronological_order(df, ordering_column)?;
    let future_df = take_rows(df, &order[n - n_holdout..])?;

    let y_future = target_values(&future_df, &pipeline.spec.target_column)?;
    let y_pred = pipeline.predict(&future_df)?;

    let metrics = match config.task {
        TaskType::Classification => {
            let proba = pipeline.predict_proba(&future_df)?;
            classification_metrics(&y_future, &y_pred, proba.as_ref())
        }
        TaskType::Regression => regression_metrics(&y_future, &y_pred),
    };

    let mut segments = Vec::new();
    let mut segment_columns: Vec<&str> = pipeline
        .spec
        .categorical_columns
        .iter()
        .map(String::as_str)
        .collect();
    segment_columns.push(ordering_column);
    for column in segment_columns {
        segments.extend(segment_errors(
            &future_df,
            column,
            &y_future,
            &y_pred,
            config.task,
            config.temporal.min_segment_size,
        )?);
    }
    segments.sort_by(|a, b| {
        (a.segment_column.as_str(), a.segment_value.as_str())
            .cmp(&(b.segment_column.as_str(), b.segment_value.as_str()))
    });

    info!(
        ordering_column,
        n_train = n - n_holdout,
        n_holdout = future_df.height(),
        segments = segments.len(),
        "temporal backtest complete"
    );

    Ok(TemporalReport {
        ordering_column: ordering_column.to_string(),
        n_train: n - n_holdout,
        n_holdout: future_df.height(),
        metrics,
        segments,
    })
}
