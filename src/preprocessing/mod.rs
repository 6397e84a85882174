//! Data preprocessing module
//!
//! Provides the fit-once feature transform used by the training pipeline:
//! - Missing value imputation (median for numeric, sentinel for categorical)
//! - Standard scaling of numeric features
//! - One-hot encoding of categorical features (drop-first, unknown-safe)

mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use encoder::OneHotEncoder;
pub use imputer::{CategoricalImputer, NumericImputer, MISSING_SENTINEL};
pub use pipeline::{Preprocessor, PreprocessorBuilder};
pub use scaler::StandardScaler;
