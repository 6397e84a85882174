//! Training orchestration and cross-validation

pub mod cross_validation;
mod trainer;

pub use cross_validation::{CvReport, KFold, StratifiedKFold};
pub use trainer::{fit_pipeline, FitOutput, TrainedPipeline, Trainer, TrainingReport};
