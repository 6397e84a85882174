//! Staged model evaluation
//!
//! Stages run in a fixed order: test metrics, baseline comparison, bootstrap
//! significance, temporal backtest. The first stage is mandatory; failures
//! in later stages are logged and leave their report section empty, so a
//! broken backtest never discards the core metrics.

pub mod bootstrap;
pub mod metrics;
pub mod temporal;

pub use bootstrap::{bootstrap_compare, BootstrapResult};
pub use metrics::{classification_metrics, regression_metrics, MetricsReport};
pub use temporal::{temporal_backtest, SegmentError, TemporalReport};

use crate::config::{PipelineConfig, TaskType};
use crate::data::target_values;
use crate::error::Result;
use crate::model::{Baseline, Estimator};
use crate::training::FitOutput;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Naive-baseline comparison section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineReport {
    pub metrics: MetricsReport,
    /// True when the baseline saw a single-class target and its numbers
    /// carry no discriminative information
    pub degenerate: bool,
}

/// Complete evaluation output. Optional sections are omitted from the
/// serialized report rather than written as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metrics: MetricsReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<BootstrapResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal: Option<TemporalReport>,
}

/// Runs the evaluation stages over a trained pipeline's held-out data.
pub struct Evaluator {
    config: PipelineConfig,
    artifacts_dir: Option<PathBuf>,
}

impl Evaluator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            config: config.clone(),
            artifacts_dir: None,
        }
    }

    /// Persist each stage's report under this directory as it completes.
    pub fn with_artifacts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.artifacts_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Evaluate on the test partition. `df` is the original full table,
    /// needed by the temporal backtest.
    pub fn evaluate(&self, output: &FitOutput, df: &DataFrame) -> Result<EvaluationReport> {
        let target = &output.pipeline.spec.target_column;
        let y_test = target_values(&output.test_df, target)?;
        let y_pred = output.pipeline.predict(&output.test_df)?;

        let test_metrics = match self.config.task {
            TaskType::Classification => {
                let proba = output.pipeline.predict_proba(&output.test_df)?;
                classification_metrics(&y_test, &y_pred, proba.as_ref())
            }
            TaskType::Regression => regression_metrics(&y_test, &y_pred),
        };
        self.persist("metrics.json", &test_metrics);

        let baseline_fit = self.baseline_stage(output, y_test.len());
        let baseline = baseline_fit.as_ref().map(|(baseline, pred)| {
            let metrics = match self.config.task {
                TaskType::Classification => classification_metrics(&y_test, pred, None),
                TaskType::Regression => regression_metrics(&y_test, pred),
            };
            BaselineReport {
                metrics,
                degenerate: baseline.is_degenerate(),
            }
        });
        if let Some(report) = &baseline {
            self.persist("metrics_baseline.json", report);
        }

        let bootstrap = baseline_fit
            .as_ref()
            .filter(|_| self.config.bootstrap.enabled)
            .and_then(|(_, baseline_pred)| {
                self.bootstrap_stage(&y_test, &y_pred, baseline_pred)
            });
        if let Some(result) = &bootstrap {
            self.persist("metrics_bootstrap.json", result);
        }

        let temporal = if self.config.temporal.enabled {
            match temporal_backtest(&output.pipeline, df, &self.config) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(error = %e, "temporal backtest failed, section omitted");
                    None
                }
            }
        } else {
            None
        };
        if let Some(report) = &temporal {
            self.persist("metrics_temporal.json", report);
        }

        info!(
            baseline = baseline.is_some(),
            bootstrap = bootstrap.is_some(),
            temporal = temporal.is_some(),
            "evaluation complete"
        );
        Ok(EvaluationReport {
            metrics: test_metrics,
            baseline,
            bootstrap,
            temporal,
        })
    }

    /// Fit the naive baseline on train plus validation targets and predict
    /// the test partition.
    fn baseline_stage(
        &self,
        output: &FitOutput,
        n_test: usize,
    ) -> Option<(Baseline, Array1<f64>)> {
        let target = &output.pipeline.spec.target_column;
        let result = (|| -> Result<(Baseline, Array1<f64>)> {
            let y_train = target_values(&output.train_df, target)?;
            let y_val = target_values(&output.val_df, target)?;
            let y_fit = Array1::from_iter(y_train.iter().chain(y_val.iter()).copied());

            // Baselines ignore features; an empty matrix carries the row
            // counts.
            let mut baseline = Baseline::for_task(self.config.task);
            baseline.fit(&Array2::zeros((y_fit.len(), 0)), &y_fit)?;
            let pred = baseline.predict(&Array2::zeros((n_test, 0)))?;
            Ok((baseline, pred))
        })();

        match result {
            Ok(fit) => Some(fit),
            Err(e) => {
                warn!(error = %e, "baseline comparison failed, section omitted");
                None
            }
        }
    }

    fn bootstrap_stage(
        &self,
        y_test: &Array1<f64>,
        y_pred: &Array1<f64>,
        baseline_pred: &Array1<f64>,
    ) -> Option<BootstrapResult> {
        match bootstrap_compare(
            y_test,
            y_pred,
            baseline_pred,
            self.config.task,
            &self.config.bootstrap,
        ) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "bootstrap comparison failed, section omitted");
                None
            }
        }
    }

    /// Best-effort stage persistence; a full disk never fails a run.
    fn persist<T: Serialize>(&self, name: &str, value: &T) {
        let Some(dir) = &self.artifacts_dir else {
            return;
        };
        let write = || -> Result<()> {
            std::fs::create_dir_all(dir)?;
            let json = serde_json::to_string_pretty(value)?;
            std::fs::write(dir.join(name), json)?;
            Ok(())
        };
        if let Err(e) = write() {
            warn!(error = %e, file = name, "failed to persist evaluation artifact");
        }
    }
}
