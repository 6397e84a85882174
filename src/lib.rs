//! # veritrain
//!
//! Training and statistical-validation pipeline for tabular models.
//!
//! The pipeline takes a raw [`polars`] DataFrame plus a [`PipelineConfig`]
//! and produces a [`TrainedPipeline`] whose preprocessing statistics are
//! computed from the training partition only, so evaluation numbers are
//! honest. Evaluation goes beyond point metrics: every run can compare the
//! model against a naive baseline, bootstrap the significance of that
//! comparison, and backtest on a chronological holdout.
//!
//! ```no_run
//! use polars::prelude::*;
//! use veritrain::prelude::*;
//!
//! # fn main() -> veritrain::Result<()> {
//! let df = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("churn.csv".into()))?
//!     .finish()?;
//!
//! let config = PipelineConfig::new(TaskType::Classification, "churned")
//!     .with_resampling(ResamplingStrategy::ClassWeight);
//! let output = fit_pipeline(&df, &config)?;
//!
//! let report = Evaluator::new(&config).evaluate(&output, &df)?;
//! println!("test f1: {}", report.metrics["f1"]);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod preprocessing;
pub mod training;

pub use error::{Result, VeritrainError};

/// Common imports for pipeline users.
pub mod prelude {
    pub use crate::artifact::{load_pipeline, save_pipeline};
    pub use crate::config::{
        BootstrapConfig, PipelineConfig, ResamplingStrategy, TaskType, TemporalConfig,
    };
    pub use crate::data::{resolve_features, FeatureSpec, SplitIndices, SplitOrchestrator};
    pub use crate::error::{Result, VeritrainError};
    pub use crate::evaluation::{
        BootstrapResult, EvaluationReport, Evaluator, SegmentError, TemporalReport,
    };
    pub use crate::model::{BaseEstimator, Estimator, ResamplingEstimator};
    pub use crate::preprocessing::{Preprocessor, PreprocessorBuilder};
    pub use crate::training::{fit_pipeline, FitOutput, TrainedPipeline, TrainingReport};
}
