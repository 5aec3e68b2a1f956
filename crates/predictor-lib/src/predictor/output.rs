//! Prediction output post-processing
//!
//! Maps raw model outputs positionally onto the pollutant list.

use crate::error::{PredictorError, Result};
use crate::models::{PredictionResult, NUM_POLLUTANTS};
use tracing::debug;

/// Formats raw model outputs into a PredictionResult
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Take the first six outputs as `[O2, NO3, NO2, SO4, PO4, CL]`.
    /// Values are passed through untouched; no range checks are applied.
    pub fn format(&self, raw_outputs: &[f64], model_version: &str) -> Result<PredictionResult> {
        if raw_outputs.len() < NUM_POLLUTANTS {
            return Err(PredictorError::ModelInvocation(format!(
                "Model output has {} values, expected {}",
                raw_outputs.len(),
                NUM_POLLUTANTS
            )));
        }
        if raw_outputs.len() > NUM_POLLUTANTS {
            debug!(
                extra = raw_outputs.len() - NUM_POLLUTANTS,
                "Ignoring trailing model outputs"
            );
        }

        let mut values = [0.0; NUM_POLLUTANTS];
        values.copy_from_slice(&raw_outputs[..NUM_POLLUTANTS]);
        Ok(PredictionResult::new(values, model_version))
    }
}
