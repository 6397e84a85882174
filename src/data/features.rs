//! Feature specification resolution
//!
//! Resolves which columns of a raw table act as numeric vs. categorical
//! features, from explicit configuration or dtype inference.

use crate::config::PipelineConfig;
use crate::error::{Result, VeritrainError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Resolved feature layout for one dataset.
///
/// Invariants: the target column is in neither feature set, and the two sets
/// are disjoint. Column order is preserved from the source (explicit list
/// order, or table order when inferred) so downstream matrix layouts are
/// stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub target_column: String,
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::String | DataType::Categorical(_, _) | DataType::Boolean
    )
}

/// Keep configured columns that exist in the table and are not excluded.
///
/// Defensive against schema drift between training data and test fixtures:
/// a configured column absent from this particular table is dropped rather
/// than raising.
fn filter_columns(candidates: &[String], df: &DataFrame, excluded: &HashSet<&str>) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| df.get_column_names().iter().any(|n| n.as_str() == c.as_str()))
        .filter(|c| !excluded.contains(c.as_str()))
        .cloned()
        .collect()
}

fn infer_columns<F>(df: &DataFrame, excluded: &HashSet<&str>, pred: F) -> Vec<String>
where
    F: Fn(&DataType) -> bool,
{
    df.get_columns()
        .iter()
        .filter(|col| pred(col.dtype()))
        .map(|col| col.name().to_string())
        .filter(|name| !excluded.contains(name.as_str()))
        .collect()
}

/// Resolve the feature spec for a table against the configuration.
///
/// Explicit feature lists are intersected with the table's actual columns;
/// when no explicit lists are given (or the intersection is empty), feature
/// types are inferred from column dtypes. Pure function of its inputs.
pub fn resolve_features(df: &DataFrame, config: &PipelineConfig) -> Result<FeatureSpec> {
    let target = &config.target_column;
    if !df.get_column_names().iter().any(|n| n.as_str() == target) {
        return Err(VeritrainError::MissingColumns(vec![target.clone()]));
    }

    let mut excluded: HashSet<&str> = config.drop_columns.iter().map(|s| s.as_str()).collect();
    excluded.insert(target.as_str());

    let mut numeric = if config.numeric_features.is_empty() {
        Vec::new()
    } else {
        filter_columns(&config.numeric_features, df, &excluded)
    };
    let mut categorical = if config.categorical_features.is_empty() {
        Vec::new()
    } else {
        filter_columns(&config.categorical_features, df, &excluded)
    };

    // Fall back to dtype inference when configuration gave us nothing usable.
    if numeric.is_empty() && categorical.is_empty() {
        numeric = infer_columns(df, &excluded, is_numeric_dtype);
        categorical = infer_columns(df, &excluded, is_categorical_dtype);
    }

    info!(
        numeric = numeric.len(),
        categorical = categorical.len(),
        "resolved feature spec"
    );

    Ok(FeatureSpec {
        numeric_columns: numeric,
        categorical_columns: categorical,
        target_column: target.clone(),
    })
}
