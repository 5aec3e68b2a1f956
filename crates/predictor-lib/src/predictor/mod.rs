//! Feature alignment and model inference

mod features;
mod inference;
mod linear;
mod output;
mod service;

pub use features::{AlignmentReport, FeatureAligner, StationPolicy};
pub use inference::OnnxRegressor;
pub use linear::{LinearModelSpec, LinearRegressor};
pub use output::OutputFormatter;
pub use service::{Prediction, PredictionService};

use crate::error::Result;
use crate::models::FeatureRow;

/// Trait for regressor implementations
pub trait Regressor: Send + Sync {
    /// Run the model on one aligned feature row and return its raw outputs
    fn predict(&self, row: &FeatureRow) -> Result<Vec<f64>>;

    /// Number of input columns the model was built for, when it declares one
    fn input_width(&self) -> Option<usize>;

    /// Get current model version
    fn version(&self) -> &str;
}
