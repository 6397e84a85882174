//! Training orchestration
//!
//! `fit_pipeline` is the single entry point: it validates configuration,
//! partitions the table, fits preprocessing on the training partition only,
//! optionally cross-validates, and fits the final estimator on the full
//! training partition.

use crate::config::{PipelineConfig, ResamplingStrategy, TaskType};
use crate::data::{resolve_features, target_values, FeatureSpec, SplitIndices, SplitOrchestrator};
use crate::error::{Result, VeritrainError};
use crate::evaluation::metrics::{f1_score, rmse};
use crate::model::{BaseEstimator, Estimator, ResamplingEstimator};
use crate::preprocessing::{Preprocessor, PreprocessorBuilder};
use crate::training::cross_validation::{CvReport, KFold, StratifiedKFold};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Fitted model plus the frozen transforms needed to score raw tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedPipeline {
    pub spec: FeatureSpec,
    pub preprocessor: Preprocessor,
    pub estimator: ResamplingEstimator,
    pub task: TaskType,
}

impl TrainedPipeline {
    /// Transform a raw table with the frozen preprocessor and predict.
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.preprocessor.transform(df)?;
        self.estimator.predict(&x)
    }

    pub fn predict_proba(&self, df: &DataFrame) -> Result<Option<Array2<f64>>> {
        let x = self.preprocessor.transform(df)?;
        self.estimator.predict_proba(&x)
    }
}

/// Summary of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_val: usize,
    pub n_test: usize,
    pub n_features: usize,
    /// Strategy actually applied, after capability resolution
    pub resampling_strategy: ResamplingStrategy,
    /// Final model's score on its own training partition (f1 or rmse)
    pub train_score: f64,
    /// Same metric on the untouched validation partition; a large gap to
    /// `train_score` flags overfitting
    pub val_score: f64,
    pub cv: Option<CvReport>,
    pub split: SplitIndices,
}

/// Everything `fit_pipeline` produces. The held-out frames are returned so
/// the evaluator can score without re-deriving the partition.
pub struct FitOutput {
    pub pipeline: TrainedPipeline,
    pub report: TrainingReport,
    pub train_df: DataFrame,
    pub val_df: DataFrame,
    pub test_df: DataFrame,
}

/// Cross-validation runner for a fixed task and fold count.
pub struct Trainer {
    task: TaskType,
    cv_folds: Option<usize>,
    seed: u64,
}

impl Trainer {
    pub fn new(task: TaskType, cv_folds: Option<usize>, seed: u64) -> Self {
        Self {
            task,
            cv_folds,
            seed,
        }
    }

    /// Score a fresh estimator per fold. A dataset too small for the fold
    /// count degrades to no cross-validation rather than failing the run.
    pub fn cross_validate<F>(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        factory: F,
    ) -> Result<Option<CvReport>>
    where
        F: Fn() -> ResamplingEstimator,
    {
        let Some(n_splits) = self.cv_folds else {
            return Ok(None);
        };

        let folds = match self.task {
            TaskType::Classification => StratifiedKFold::new(n_splits, self.seed).split(y),
            TaskType::Regression => KFold::new(n_splits, self.seed).split(y.len()),
        };
        let folds = match folds {
            Ok(folds) => folds,
            Err(VeritrainError::InsufficientData(reason)) => {
                warn!(reason = %reason, "skipping cross-validation");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut scores = Vec::with_capacity(folds.len());
        for (train_idx, test_idx) in &folds {
            let x_fit = x.select(Axis(0), train_idx);
            let y_fit = Array1::from_iter(train_idx.iter().map(|&i| y[i]));
            let x_score = x.select(Axis(0), test_idx);
            let y_score = Array1::from_iter(test_idx.iter().map(|&i| y[i]));

            let mut estimator = factory();
            estimator.fit(&x_fit, &y_fit)?;
            let pred = estimator.predict(&x_score)?;
            scores.push(match self.task {
                TaskType::Classification => f1_score(&y_score, &pred),
                TaskType::Regression => rmse(&y_score, &pred),
            });
        }

        let metric = match self.task {
            TaskType::Classification => "f1",
            TaskType::Regression => "rmse",
        };
        Ok(Some(CvReport::from_scores(metric, scores)))
    }
}

/// Run the full training pipeline on a raw table.
pub fn fit_pipeline(df: &DataFrame, config: &PipelineConfig) -> Result<FitOutput> {
    config.validate()?;
    let strategy = config.resampling_strategy.resolve();

    let spec = resolve_features(df, config)?;
    let orchestrator = SplitOrchestrator::from_config(config);
    let (train_df, val_df, test_df, split) = orchestrator.split(df, &spec.target_column)?;

    // All fit-time statistics come from the training partition.
    let mut preprocessor =
        PreprocessorBuilder::build(&spec.numeric_columns, &spec.categorical_columns);
    preprocessor.fit(&train_df)?;
    let x_train = preprocessor.transform(&train_df)?;
    let y_train = target_values(&train_df, &spec.target_column)?;

    let factory = || {
        let balanced = strategy == ResamplingStrategy::ClassWeight;
        ResamplingEstimator::new(
            BaseEstimator::for_task(config.task, balanced),
            strategy,
            config.seed,
        )
    };

    let trainer = Trainer::new(config.task, config.cv_folds, config.seed);
    let cv = trainer.cross_validate(&x_train, &y_train, &factory)?;
    if let Some(report) = &cv {
        info!(
            metric = %report.metric,
            mean = report.mean,
            std = report.std,
            "cross-validation complete"
        );
    }

    // Final fit always uses the whole training partition.
    let mut estimator = factory();
    estimator.fit(&x_train, &y_train)?;
    let score = |y_true: &Array1<f64>, y_pred: &Array1<f64>| match config.task {
        TaskType::Classification => f1_score(y_true, y_pred),
        TaskType::Regression => rmse(y_true, y_pred),
    };
    let train_score = score(&y_train, &estimator.predict(&x_train)?);

    let x_val = preprocessor.transform(&val_df)?;
    let y_val = target_values(&val_df, &spec.target_column)?;
    let val_score = score(&y_val, &estimator.predict(&x_val)?);

    let report = TrainingReport {
        n_train: train_df.height(),
        n_val: val_df.height(),
        n_test: test_df.height(),
        n_features: preprocessor.n_features(),
        resampling_strategy: strategy,
        train_score,
        val_score,
        cv,
        split,
    };
    info!(
        n_train = report.n_train,
        n_val = report.n_val,
        n_test = report.n_test,
        n_features = report.n_features,
        train_score = report.train_score,
        val_score = report.val_score,
        "trained pipeline"
    );

    Ok(FitOutput {
        pipeline: TrainedPipeline {
            spec,
            preprocessor,
            estimator,
            task: config.task,
        },
        report,
        train_df,
        val_df,
        test_df,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn separable(n_per_class: usize) -> (Array2<f64>, Array1<f64>) {
        let n = 2 * n_per_class;
        let x = Array2::from_shape_fn((n, 2), |(r, c)| {
            let base = if r < n_per_class { -2.0 } else { 2.0 };
            base + 0.05 * ((r % n_per_class) as f64) + 0.1 * (c as f64)
        });
        let y = Array1::from_shape_fn(n, |r| if r < n_per_class { 0.0 } else { 1.0 });
        (x, y)
    }

    fn classifier_factory() -> ResamplingEstimator {
        ResamplingEstimator::new(
            BaseEstimator::for_task(TaskType::Classification, false),
            ResamplingStrategy::None,
            42,
        )
    }

    #[test]
    fn test_cross_validate_separable_scores_high() {
        let (x, y) = separable(25);
        let trainer = Trainer::new(TaskType::Classification, Some(5), 42);
        let report = trainer
            .cross_validate(&x, &y, classifier_factory)
            .unwrap()
            .unwrap();
        assert_eq!(report.metric, "f1");
        assert_eq!(report.scores.len(), 5);
        assert!(report.mean > 0.95, "mean f1 was {}", report.mean);
    }

    #[test]
    fn test_cross_validate_disabled() {
        let (x, y) = separable(10);
        let trainer = Trainer::new(TaskType::Classification, None, 42);
        assert!(trainer
            .cross_validate(&x, &y, classifier_factory)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_cross_validate_degrades_on_sparse_class() {
        // Minority class of 2 cannot fill 5 folds.
        let x = Array2::from_shape_fn((12, 1), |(r, _)| r as f64);
        let mut y = Array1::zeros(12);
        y[10] = 1.0;
        y[11] = 1.0;
        let trainer = Trainer::new(TaskType::Classification, Some(5), 42);
        assert!(trainer
            .cross_validate(&x, &y, classifier_factory)
            .unwrap()
            .is_none());
    }
}
