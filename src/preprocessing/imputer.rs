//! Missing-value imputation

use crate::error::{Result, VeritrainError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel used for missing categorical values
pub const MISSING_SENTINEL: &str = "missing";

/// Median imputer for numeric columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericImputer {
    medians: HashMap<String, f64>,
    is_fitted: bool,
}

impl NumericImputer {
    pub fn new() -> Self {
        Self {
            medians: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Learn per-column medians. Columns are cast to Float64 first so
    /// integer features behave like floats downstream.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let ca = float_column(df, col_name)?;
            let median = ca.median().unwrap_or(0.0);
            self.medians.insert(col_name.clone(), median);
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace nulls with the stored medians, returning a new frame.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(VeritrainError::NotFitted("NumericImputer"));
        }

        let mut result = df.clone();
        for (col_name, &median) in &self.medians {
            let ca = float_column(df, col_name)?;
            let filled: Float64Chunked = ca.into_iter().map(|v| Some(v.unwrap_or(median))).collect();
            let series = filled.with_name(col_name.as_str().into()).into_series();
            result = result.with_column(series)?.clone();
        }
        Ok(result)
    }

    pub fn median(&self, column: &str) -> Option<f64> {
        self.medians.get(column).copied()
    }
}

impl Default for NumericImputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Constant-sentinel imputer for categorical columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalImputer {
    columns: Vec<String>,
    sentinel: String,
    is_fitted: bool,
}

impl CategoricalImputer {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            sentinel: MISSING_SENTINEL.to_string(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, _df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.columns = columns.to_vec();
        self.is_fitted = true;
        Ok(self)
    }

    /// Normalize categorical columns to String dtype (covers bool and
    /// dictionary-encoded columns) and replace nulls with the sentinel.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(VeritrainError::NotFitted("CategoricalImputer"));
        }

        let mut result = df.clone();
        for col_name in &self.columns {
            let ca = string_column(df, col_name)?;
            let filled: StringChunked = ca
                .into_iter()
                .map(|v| Some(v.unwrap_or(self.sentinel.as_str()).to_string()))
                .collect();
            let series = filled.with_name(col_name.as_str().into()).into_series();
            result = result.with_column(series)?.clone();
        }
        Ok(result)
    }
}

impl Default for CategoricalImputer {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn float_column(df: &DataFrame, col_name: &str) -> Result<Float64Chunked> {
    let column = df
        .column(col_name)
        .map_err(|_| VeritrainError::ColumnNotFound(col_name.to_string()))?;
    let casted = column
        .cast(&DataType::Float64)
        .map_err(|e| VeritrainError::DataError(e.to_string()))?;
    let ca = casted
        .f64()
        .map_err(|e| VeritrainError::DataError(e.to_string()))?;
    Ok(ca.clone())
}

pub(crate) fn string_column(df: &DataFrame, col_name: &str) -> Result<StringChunked> {
    let column = df
        .column(col_name)
        .map_err(|_| VeritrainError::ColumnNotFound(col_name.to_string()))?;
    let casted = column
        .cast(&DataType::String)
        .map_err(|e| VeritrainError::DataError(e.to_string()))?;
    let ca = casted
        .str()
        .map_err(|e| VeritrainError::DataError(e.to_string()))?;
    Ok(ca.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_median_fill() {
        let df = df!("a" => &[Some(1.0), None, Some(3.0), Some(5.0)]).unwrap();
        let mut imputer = NumericImputer::new();
        imputer.fit(&df, &["a".to_string()]).unwrap();
        assert_eq!(imputer.median("a"), Some(3.0));

        let filled = imputer.transform(&df).unwrap();
        let ca = filled.column("a").unwrap().f64().unwrap();
        assert_eq!(ca.get(1), Some(3.0));
        assert_eq!(ca.null_count(), 0);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = df!("a" => &[1.0]).unwrap();
        let imputer = NumericImputer::new();
        assert!(matches!(
            imputer.transform(&df),
            Err(VeritrainError::NotFitted(_))
        ));
    }

    #[test]
    fn test_categorical_sentinel_fill() {
        let df = df!("plan" => &[Some("basic"), None, Some("pro")]).unwrap();
        let mut imputer = CategoricalImputer::new();
        imputer.fit(&df, &["plan".to_string()]).unwrap();

        let filled = imputer.transform(&df).unwrap();
        let ca = filled.column("plan").unwrap().str().unwrap();
        assert_eq!(ca.get(1), Some(MISSING_SENTINEL));
    }

    #[test]
    fn test_boolean_column_becomes_string() {
        let df = df!("active" => &[true, false]).unwrap();
        let mut imputer = CategoricalImputer::new();
        imputer.fit(&df, &["active".to_string()]).unwrap();

        let filled = imputer.transform(&df).unwrap();
        let ca = filled.column("active").unwrap().str().unwrap();
        assert_eq!(ca.get(0), Some("true"));
    }
}
