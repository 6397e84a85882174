//! One-hot categorical encoding

use super::imputer::string_column;
use crate::error::{Result, VeritrainError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One-hot encoder with drop-first semantics.
///
/// Vocabularies are sorted at fit time so output column order is stable
/// across runs. The first category of each column is dropped to avoid
/// collinearity in linear models. Categories unseen at fit time map to an
/// all-zero indicator vector at transform time; they never raise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Fit-order column list
    columns: Vec<String>,
    /// Sorted vocabulary per column
    vocabularies: HashMap<String, Vec<String>>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            vocabularies: HashMap::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.columns = columns.to_vec();
        for col_name in columns {
            let ca = string_column(df, col_name)?;
            let mut vocab: Vec<String> = ca
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            vocab.sort();
            self.vocabularies.insert(col_name.clone(), vocab);
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column with its indicator columns
    /// (`{col}_{category}`, first category dropped).
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(VeritrainError::NotFitted("OneHotEncoder"));
        }

        let mut result = df.clone();
        for col_name in &self.columns {
            let vocab = &self.vocabularies[col_name];
            let ca = string_column(df, col_name)?;

            for category in vocab.iter().skip(1) {
                let values: Vec<f64> = ca
                    .into_iter()
                    .map(|v| if v == Some(category.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                let name = format!("{col_name}_{category}");
                let series = Series::new(name.into(), values);
                result = result.with_column(series)?.clone();
            }

            result = result.drop(col_name)?;
        }
        Ok(result)
    }

    /// Names of the indicator columns produced by `transform`, in order.
    pub fn output_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|col| {
                self.vocabularies[col]
                    .iter()
                    .skip(1)
                    .map(move |cat| format!("{col}_{cat}"))
            })
            .collect()
    }
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}
