//! Feature preprocessing pipeline
//!
//! Numeric branch: median imputation, then standard scaling. Categorical
//! branch: sentinel imputation, then one-hot encoding (drop-first, unknown
//! categories encode to all zeros). The pipeline fits exactly once, on the
//! training partition, and transforms any frame to a dense feature matrix
//! with a stable column layout.

use super::encoder::OneHotEncoder;
use super::imputer::{float_column, CategoricalImputer, NumericImputer};
use super::scaler::StandardScaler;
use crate::error::{Result, VeritrainError};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Builds unfitted preprocessors from a resolved feature layout.
pub struct PreprocessorBuilder;

impl PreprocessorBuilder {
    pub fn build(numeric_columns: &[String], categorical_columns: &[String]) -> Preprocessor {
        Preprocessor {
            numeric_columns: numeric_columns.to_vec(),
            categorical_columns: categorical_columns.to_vec(),
            numeric_imputer: NumericImputer::new(),
            categorical_imputer: CategoricalImputer::new(),
            scaler: StandardScaler::new(),
            encoder: OneHotEncoder::new(),
            output_columns: Vec::new(),
            is_fitted: false,
        }
    }
}

/// Fit-once feature transform.
///
/// After `fit`, all imputation statistics, scaling parameters, and category
/// vocabularies are frozen; `transform` is deterministic and side-effect
/// free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: NumericImputer,
    categorical_imputer: CategoricalImputer,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    output_columns: Vec<String>,
    is_fitted: bool,
}

impl Preprocessor {
    /// Fit on the training partition. Refitting an already-fitted
    /// preprocessor is a caller-ordering bug and fails.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if self.is_fitted {
            return Err(VeritrainError::AlreadyFitted("Preprocessor"));
        }

        if !self.numeric_columns.is_empty() {
            self.numeric_imputer.fit(df, &self.numeric_columns)?;
            // Scaler statistics are computed over imputed values, matching
            // what transform will feed the model.
            let imputed = self.numeric_imputer.transform(df)?;
            self.scaler.fit(&imputed, &self.numeric_columns)?;
        }

        if !self.categorical_columns.is_empty() {
            self.categorical_imputer.fit(df, &self.categorical_columns)?;
            let imputed = self.categorical_imputer.transform(df)?;
            self.encoder.fit(&imputed, &self.categorical_columns)?;
        }

        self.output_columns = self.numeric_columns.clone();
        self.output_columns.extend(self.encoder.output_columns());
        self.is_fitted = true;

        debug!(
            features = self.output_columns.len(),
            "fitted preprocessor"
        );
        Ok(self)
    }

    /// Transform a frame into the fitted feature matrix layout.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(VeritrainError::NotFitted("Preprocessor"));
        }

        let mut frame = df.clone();
        if !self.numeric_columns.is_empty() {
            frame = self.numeric_imputer.transform(&frame)?;
            frame = self.scaler.transform(&frame)?;
        }
        if !self.categorical_columns.is_empty() {
            frame = self.categorical_imputer.transform(&frame)?;
            frame = self.encoder.transform(&frame)?;
        }

        columns_to_array2(&frame, &self.output_columns)
    }

    /// Number of columns in the transformed matrix
    pub fn n_features(&self) -> usize {
        self.output_columns.len()
    }

    /// Output column names, numeric features first then one-hot indicators
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    /// Stored training mean of a numeric feature (leakage audit hook)
    pub fn numeric_mean(&self, column: &str) -> Option<f64> {
        self.scaler.mean(column)
    }
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let ca = float_column(df, col_name)?;
            Ok(ca.into_iter().map(|v| v.unwrap_or(0.0)).collect())
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_df() -> DataFrame {
        df!(
            "age" => &[20.0, 30.0, 40.0, 50.0],
            "income" => &[Some(1000.0), None, Some(3000.0), Some(4000.0)],
            "plan" => &["basic", "pro", "basic", "premium"]
        )
        .unwrap()
    }

    fn built() -> Preprocessor {
        PreprocessorBuilder::build(
            &["age".to_string(), "income".to_string()],
            &["plan".to_string()],
        )
    }

    #[test]
    fn test_transform_shape_and_layout() {
        let df = mixed_df();
        let mut prep = built();
        prep.fit(&df).unwrap();

        // 2 numeric + (3 plan categories - 1 dropped) = 4 features
        assert_eq!(prep.n_features(), 4);
        let x = prep.transform(&df).unwrap();
        assert_eq!(x.dim(), (4, 4));
        assert_eq!(
            prep.output_columns(),
            &["age", "income", "plan_premium", "plan_pro"]
        );
    }

    #[test]
    fn test_fit_is_once_only() {
        let df = mixed_df();
        let mut prep = built();
        prep.fit(&df).unwrap();
        assert!(matches!(
            prep.fit(&df),
            Err(VeritrainError::AlreadyFitted(_))
        ));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let prep = built();
        assert!(matches!(
            prep.transform(&mixed_df()),
            Err(VeritrainError::NotFitted(_))
        ));
    }

    #[test]
    fn test_unknown_category_encodes_to_zeros() {
        let mut prep = built();
        prep.fit(&mixed_df()).unwrap();

        let unseen = df!(
            "age" => &[30.0],
            "income" => &[2000.0],
            "plan" => &["enterprise"]
        )
        .unwrap();
        let x = prep.transform(&unseen).unwrap();
        // Both indicator columns are zero
        assert_eq!(x[[0, 2]], 0.0);
        assert_eq!(x[[0, 3]], 0.0);
    }

    #[test]
    fn test_statistics_come_from_fit_frame_only() {
        let train = df!(
            "age" => &[10.0, 20.0, 30.0],
            "income" => &[1.0, 2.0, 3.0],
            "plan" => &["a", "b", "a"]
        )
        .unwrap();
        let mut prep = built();
        prep.fit(&train).unwrap();

        assert_eq!(prep.numeric_mean("age"), Some(20.0));

        // Transforming a frame with wildly different values must not move
        // the stored statistics.
        let other = df!(
            "age" => &[1000.0],
            "income" => &[9999.0],
            "plan" => &["a"]
        )
        .unwrap();
        prep.transform(&other).unwrap();
        assert_eq!(prep.numeric_mean("age"), Some(20.0));
    }
}
