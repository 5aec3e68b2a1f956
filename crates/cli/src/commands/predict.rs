//! Prediction commands

use anyhow::Result;
use pollutant_lib::{
    models::{InputBounds, RawInput},
    predictor::PredictionService,
};
use std::io;

use crate::output::{print_prediction, print_row, print_warning, OutputFormat};
use crate::prompt::prompt_input;

/// Predict from flags, within the same bounds as the web form
pub fn predict(
    service: &PredictionService,
    year: i32,
    month: u32,
    station_id: i64,
    format: OutputFormat,
) -> Result<()> {
    let input = RawInput::new(year, month, station_id);
    InputBounds::default().validate(&input)?;

    let prediction = service.predict(&input)?;
    print_prediction(&prediction, format)
}

/// Prompt on stdin, then predict
pub fn interactive(service: &PredictionService, format: OutputFormat) -> Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stderr();

    let input = prompt_input(&mut reader, &mut writer, &InputBounds::default())?;
    let prediction = service.predict(&input)?;
    print_prediction(&prediction, format)
}

/// Show the aligned feature row. Bounds are not enforced here so that
/// any station id can be inspected.
pub fn align(
    service: &PredictionService,
    year: i32,
    month: u32,
    station_id: i64,
    format: OutputFormat,
) -> Result<()> {
    let input = RawInput::new(year, month, station_id);
    let (row, report) = service.align(&input)?;

    print_row(&row, format)?;

    if format != OutputFormat::Json {
        if report.unknown_station {
            print_warning(&format!(
                "Station {} is not in the model schema; all station columns are zero",
                station_id
            ));
        }
        if !report.dropped.is_empty() {
            print_warning(&format!("Dropped columns: {}", report.dropped.join(", ")));
        }
    }
    Ok(())
}
