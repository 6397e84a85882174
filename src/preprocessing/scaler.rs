//! Zero-mean/unit-variance feature scaling

use super::imputer::float_column;
use crate::error::{Result, VeritrainError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    mean: f64,
    std: f64,
}

/// Standard scaler: (x - mean) / std, per column.
///
/// Fitted means are observable via [`StandardScaler::mean`] so callers can
/// verify statistics were computed on the training partition alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let ca = float_column(df, col_name)?;
            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(1).unwrap_or(1.0);
            self.params.insert(
                col_name.clone(),
                ScalerParams {
                    mean,
                    // Constant columns scale by 1.0 to avoid division by zero
                    std: if std == 0.0 { 1.0 } else { std },
                },
            );
        }
        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(VeritrainError::NotFitted("StandardScaler"));
        }

        let mut result = df.clone();
        for (col_name, params) in &self.params {
            let ca = float_column(df, col_name)?;
            let scaled: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.map(|v| (v - params.mean) / params.std))
                .collect();
            let series = scaled.with_name(col_name.as_str().into()).into_series();
            result = result.with_column(series)?.clone();
        }
        Ok(result)
    }

    /// Stored mean for a fitted column
    pub fn mean(&self, column: &str) -> Option<f64> {
        self.params.get(column).map(|p| p.mean)
    }

    /// Stored standard deviation for a fitted column
    pub fn std(&self, column: &str) -> Option<f64> {
        self.params.get(column).map(|p| p.std)
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}
