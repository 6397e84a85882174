//! Pipeline configuration
//!
//! The configuration object is supplied verbatim by an external config/CLI
//! layer; this crate performs its own validation and never trusts field
//! presence. All fields have serde defaults so partial documents deserialize.

use crate::error::{Result, VeritrainError};
use serde::{Deserialize, Serialize};

/// Type of ML task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Binary classification
    Classification,
    /// Regression
    Regression,
}

/// Class-imbalance resampling strategy applied before the final fit.
///
/// A closed set of tags: unknown tags fail at deserialization time, before
/// any training work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingStrategy {
    /// Pass features/labels through unchanged
    None,
    /// Synthetic minority oversampling until classes are balanced
    Oversample,
    /// Randomly drop majority-class rows until classes are balanced
    Undersample,
    /// No resampling; the wrapped estimator uses balanced class weights
    ClassWeight,
}

impl ResamplingStrategy {
    /// Resolve the strategy against compiled-in capabilities.
    ///
    /// Oversampling requires the `smote` feature; without it the strategy
    /// degrades to [`ResamplingStrategy::None`] with a warning. Resolve once
    /// at setup so the fit path never re-checks.
    pub fn resolve(self) -> Self {
        if matches!(self, Self::Oversample) && !cfg!(feature = "smote") {
            tracing::warn!("oversampling support not compiled in (feature `smote`), degrading to no resampling");
            return Self::None;
        }
        self
    }
}

/// Bootstrap significance test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub enabled: bool,
    pub n_resamples: usize,
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            n_resamples: 200,
            seed: 42,
        }
    }
}

/// Temporal backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    pub enabled: bool,
    /// Fraction of chronologically latest rows used as the forward holdout
    pub test_size: f64,
    /// Time-like column the dataset is ordered by
    pub ordering_column: Option<String>,
    /// Minimum rows per segment value for the segment error table
    pub min_segment_size: usize,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            test_size: 0.2,
            ordering_column: None,
            min_segment_size: 30,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub task: TaskType,
    pub target_column: String,
    /// Explicit numeric feature columns (empty = infer from dtypes)
    pub numeric_features: Vec<String>,
    /// Explicit categorical feature columns (empty = infer from dtypes)
    pub categorical_features: Vec<String>,
    /// Columns excluded from the feature set (ids, free text, ...)
    pub drop_columns: Vec<String>,
    pub test_size: f64,
    pub val_size: f64,
    pub seed: u64,
    pub resampling_strategy: ResamplingStrategy,
    /// Number of stratified CV folds; None disables cross-validation
    pub cv_folds: Option<usize>,
    pub bootstrap: BootstrapConfig,
    pub temporal: TemporalConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            task: TaskType::Classification,
            target_column: "target".to_string(),
            numeric_features: Vec::new(),
            categorical_features: Vec::new(),
            drop_columns: Vec::new(),
            test_size: 0.2,
            val_size: 0.1,
            seed: 42,
            resampling_strategy: ResamplingStrategy::None,
            cv_folds: Some(5),
            bootstrap: BootstrapConfig::default(),
            temporal: TemporalConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration for a task and target column
    pub fn new(task: TaskType, target: impl Into<String>) -> Self {
        Self {
            task,
            target_column: target.into(),
            ..Default::default()
        }
    }

    /// Builder method to set split fractions
    pub fn with_split(mut self, test_size: f64, val_size: f64) -> Self {
        self.test_size = test_size;
        self.val_size = val_size;
        self
    }

    /// Builder method to set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the resampling strategy
    pub fn with_resampling(mut self, strategy: ResamplingStrategy) -> Self {
        self.resampling_strategy = strategy;
        self
    }

    /// Builder method to set CV folds (None disables CV)
    pub fn with_cv(mut self, folds: Option<usize>) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Validate cross-field constraints.
    ///
    /// Called at setup time so bad configuration surfaces before any fit
    /// loop starts.
    pub fn validate(&self) -> Result<()> {
        if self.target_column.is_empty() {
            return Err(VeritrainError::ConfigError(
                "target_column must not be empty".to_string(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(VeritrainError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if !(self.val_size > 0.0 && self.val_size < 1.0) {
            return Err(VeritrainError::ConfigError(format!(
                "val_size must be in (0, 1), got {}",
                self.val_size
            )));
        }
        if self.test_size + self.val_size >= 1.0 {
            return Err(VeritrainError::ConfigError(format!(
                "test_size + val_size must be < 1, got {}",
                self.test_size + self.val_size
            )));
        }
        if let Some(folds) = self.cv_folds {
            if folds < 2 {
                return Err(VeritrainError::ConfigError(format!(
                    "cv_folds must be at least 2, got {folds}"
                )));
            }
        }
        if self.task == TaskType::Regression
            && self.resampling_strategy != ResamplingStrategy::None
        {
            return Err(VeritrainError::ConfigError(
                "resampling strategies only apply to classification tasks".to_string(),
            ));
        }
        if self.bootstrap.enabled && self.bootstrap.n_resamples == 0 {
            return Err(VeritrainError::ConfigError(
                "bootstrap.n_resamples must be at least 1".to_string(),
            ));
        }
        if self.temporal.enabled && !(self.temporal.test_size > 0.0 && self.temporal.test_size < 1.0)
        {
            return Err(VeritrainError::ConfigError(format!(
                "temporal.test_size must be in (0, 1), got {}",
                self.temporal.test_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_split_fractions() {
        let config = PipelineConfig::default().with_split(0.7, 0.4);
        assert!(matches!(
            config.validate(),
            Err(VeritrainError::ConfigError(_))
        ));

        let config = PipelineConfig::default().with_split(0.0, 0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cv_folds_minimum() {
        let config = PipelineConfig::default().with_cv(Some(1));
        assert!(config.validate().is_err());
        let config = PipelineConfig::default().with_cv(None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resampling_rejected_for_regression() {
        let config = PipelineConfig::new(TaskType::Regression, "price")
            .with_resampling(ResamplingStrategy::Undersample);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_strategy_tag_fails_at_parse() {
        let parsed: std::result::Result<ResamplingStrategy, _> =
            serde_json::from_str("\"adasyn\"");
        assert!(parsed.is_err());

        let parsed: std::result::Result<ResamplingStrategy, _> =
            serde_json::from_str("\"class_weight\"");
        assert_eq!(parsed.unwrap(), ResamplingStrategy::ClassWeight);
    }

    #[test]
    fn test_partial_document_deserializes_with_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"target_column": "churned", "test_size": 0.25}"#).unwrap();
        assert_eq!(config.target_column, "churned");
        assert_eq!(config.test_size, 0.25);
        assert_eq!(config.cv_folds, Some(5));
        assert_eq!(config.bootstrap.n_resamples, 200);
    }

    #[cfg(feature = "smote")]
    #[test]
    fn test_resolve_keeps_oversample_when_available() {
        assert_eq!(
            ResamplingStrategy::Oversample.resolve(),
            ResamplingStrategy::Oversample
        );
    }

    #[cfg(not(feature = "smote"))]
    #[test]
    fn test_resolve_degrades_oversample_when_unavailable() {
        assert_eq!(
            ResamplingStrategy::Oversample.resolve(),
            ResamplingStrategy::None
        );
    }
}
