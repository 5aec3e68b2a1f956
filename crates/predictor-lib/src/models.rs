//! Core data models for the pollutant predictor

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of pollutant concentrations produced per prediction
pub const NUM_POLLUTANTS: usize = 6;

/// Pollutants predicted by the model, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pollutant {
    O2,
    No3,
    No2,
    So4,
    Po4,
    Cl,
}

impl Pollutant {
    pub const ALL: [Pollutant; NUM_POLLUTANTS] = [
        Pollutant::O2,
        Pollutant::No3,
        Pollutant::No2,
        Pollutant::So4,
        Pollutant::Po4,
        Pollutant::Cl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Pollutant::O2 => "O2",
            Pollutant::No3 => "NO3",
            Pollutant::No2 => "NO2",
            Pollutant::So4 => "SO4",
            Pollutant::Po4 => "PO4",
            Pollutant::Cl => "CL",
        }
    }

    /// Position of this pollutant in the model output vector
    pub fn index(&self) -> usize {
        Pollutant::ALL
            .iter()
            .position(|p| p == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw values submitted through the prediction form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInput {
    pub year: i32,
    pub month: u32,
    pub station_id: i64,
}

impl RawInput {
    pub fn new(year: i32, month: u32, station_id: i64) -> Self {
        Self {
            year,
            month,
            station_id,
        }
    }
}

/// Bounds enforced by the form widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBounds {
    pub year_min: i32,
    pub year_max: i32,
    pub year_default: i32,
    pub month_min: u32,
    pub month_max: u32,
    pub station_min: i64,
    pub station_max: i64,
}

impl Default for InputBounds {
    fn default() -> Self {
        Self {
            year_min: 2000,
            year_max: 2047,
            year_default: 2025,
            month_min: 1,
            month_max: 12,
            station_min: 1,
            station_max: 22,
        }
    }
}

impl InputBounds {
    /// Input pre-filled in the form before the user touches anything
    pub fn default_input(&self) -> RawInput {
        RawInput::new(self.year_default, self.month_min, self.station_min)
    }

    pub fn validate(&self, input: &RawInput) -> Result<()> {
        if !(self.year_min..=self.year_max).contains(&input.year) {
            return Err(PredictorError::InvalidInput(format!(
                "year {} outside {}..={}",
                input.year, self.year_min, self.year_max
            )));
        }
        if !(self.month_min..=self.month_max).contains(&input.month) {
            return Err(PredictorError::InvalidInput(format!(
                "month {} outside {}..={}",
                input.month, self.month_min, self.month_max
            )));
        }
        if !(self.station_min..=self.station_max).contains(&input.station_id) {
            return Err(PredictorError::InvalidInput(format!(
                "station id {} outside {}..={}",
                input.station_id, self.station_min, self.station_max
            )));
        }
        Ok(())
    }
}

/// A single feature row laid out exactly as the model schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    pub(crate) fn from_parts(columns: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Values as model input (ONNX graphs take f32)
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(|v| *v as f32).collect()
    }
}

/// Predicted pollutant concentrations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub values: [f64; NUM_POLLUTANTS],
    pub model_version: String,
    pub generated_at: i64,
}

impl PredictionResult {
    pub fn new(values: [f64; NUM_POLLUTANTS], model_version: impl Into<String>) -> Self {
        Self {
            values,
            model_version: model_version.into(),
            generated_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn get(&self, pollutant: Pollutant) -> f64 {
        self.values[pollutant.index()]
    }

    pub fn pairs(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        Pollutant::ALL.iter().copied().zip(self.values.iter().copied())
    }

    /// `NAME: value` lines rounded to two decimals
    pub fn display_lines(&self) -> Vec<String> {
        self.pairs()
            .map(|(p, v)| format!("{}: {:.2}", p, v))
            .collect()
    }
}

/// Heading shown above the prediction values
pub fn result_heading(input: &RawInput) -> String {
    format!(
        "Predicted pollutants (for {}/{} with station id: {})",
        input.month, input.year, input.station_id
    )
}
