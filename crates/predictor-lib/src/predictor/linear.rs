//! Linear multi-output regressor loaded from JSON
//!
//! Covers models exported as plain coefficient matrices, one row of
//! coefficients and one intercept per pollutant.

use super::Regressor;
use crate::error::{PredictorError, Result};
use crate::models::{FeatureRow, NUM_POLLUTANTS};
use serde::{Deserialize, Serialize};

/// Serialized form of a linear model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelSpec {
    #[serde(default = "default_version")]
    pub version: String,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

fn default_version() -> String {
    "linear".to_string()
}

/// Linear regressor: `y_k = intercept_k + sum_j coef_kj * x_j`
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    width: usize,
    version: String,
}

impl LinearRegressor {
    pub fn new(spec: LinearModelSpec) -> Result<Self> {
        if spec.coefficients.len() != NUM_POLLUTANTS {
            return Err(PredictorError::InvalidInput(format!(
                "linear model has {} coefficient rows, expected {}",
                spec.coefficients.len(),
                NUM_POLLUTANTS
            )));
        }
        if spec.intercepts.len() != NUM_POLLUTANTS {
            return Err(PredictorError::InvalidInput(format!(
                "linear model has {} intercepts, expected {}",
                spec.intercepts.len(),
                NUM_POLLUTANTS
            )));
        }

        let width = spec.coefficients[0].len();
        if width == 0 || spec.coefficients.iter().any(|row| row.len() != width) {
            return Err(PredictorError::InvalidInput(
                "linear model coefficient rows must be non-empty and equally long".to_string(),
            ));
        }

        Ok(Self {
            coefficients: spec.coefficients,
            intercepts: spec.intercepts,
            width,
            version: spec.version,
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let spec: LinearModelSpec = serde_json::from_slice(bytes)
            .map_err(|e| PredictorError::InvalidInput(format!("malformed linear model: {}", e)))?;
        Self::new(spec)
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, row: &FeatureRow) -> Result<Vec<f64>> {
        if row.len() != self.width {
            return Err(PredictorError::ModelInvocation(format!(
                "model expects {} features, row has {}",
                self.width,
                row.len()
            )));
        }

        let x = row.values();
        Ok(self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(coef, intercept)| {
                intercept + coef.iter().zip(x).map(|(c, v)| c * v).sum::<f64>()
            })
            .collect())
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn version(&self) -> &str {
        &self.version
    }
}
