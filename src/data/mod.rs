//! Dataset access and partitioning
//!
//! The pipeline never mutates a caller's DataFrame in place: every transform
//! returns a new frame or matrix.

mod features;
mod split;

pub use features::{resolve_features, FeatureSpec};
pub use split::{SplitIndices, SplitOrchestrator};

use crate::error::{Result, VeritrainError};
use ndarray::Array1;
use polars::prelude::*;

/// Materialize a row subset of a DataFrame by positional indices.
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: IdxCa = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    df.take(&idx).map_err(Into::into)
}

/// Extract the target column as a dense f64 vector.
///
/// Integer and boolean targets are cast; nulls are rejected rather than
/// silently imputed, since a missing label is a data bug.
pub fn target_values(df: &DataFrame, target_column: &str) -> Result<Array1<f64>> {
    let column = df
        .column(target_column)
        .map_err(|_| VeritrainError::ColumnNotFound(target_column.to_string()))?;
    let casted = column
        .cast(&DataType::Float64)
        .map_err(|e| VeritrainError::DataError(e.to_string()))?;
    let ca = casted
        .f64()
        .map_err(|e| VeritrainError::DataError(e.to_string()))?;

    let mut values = Vec::with_capacity(ca.len());
    for (row, v) in ca.into_iter().enumerate() {
        match v {
            Some(v) => values.push(v),
            None => {
                return Err(VeritrainError::DataError(format!(
                    "target column '{target_column}' has a null at row {row}"
                )))
            }
        }
    }

    Ok(Array1::from_vec(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_rows() {
        let df = df!(
            "a" => &[10.0, 20.0, 30.0, 40.0],
            "b" => &["w", "x", "y", "z"]
        )
        .unwrap();

        let subset = take_rows(&df, &[1, 3]).unwrap();
        assert_eq!(subset.height(), 2);
        let a = subset.column("a").unwrap().f64().unwrap();
        assert_eq!(a.get(0), Some(20.0));
        assert_eq!(a.get(1), Some(40.0));
    }

    #[test]
    fn test_target_values_casts_integers() {
        let df = df!("y" => &[0i64, 1, 1, 0]).unwrap();
        let y = target_values(&df, "y").unwrap();
        assert_eq!(y.len(), 4);
        assert_eq!(y[1], 1.0);
    }

    #[test]
    fn test_target_values_missing_column() {
        let df = df!("a" => &[1.0]).unwrap();
        assert!(matches!(
            target_values(&df, "y"),
            Err(VeritrainError::ColumnNotFound(_))
        ));
    }
}
