//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use pollutant_lib::models::{result_heading, FeatureRow};
use pollutant_lib::predictor::Prediction;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `NAME: value` lines (default)
    #[default]
    Text,
    /// Table format
    Table,
    /// JSON format
    Json,
}

#[derive(Tabled)]
struct PollutantRow {
    #[tabled(rename = "Pollutant")]
    pollutant: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct FeatureCell {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Print a JSON document
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a prediction in the requested format
pub fn print_prediction(prediction: &Prediction, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(prediction)?,
        OutputFormat::Text => {
            println!("{}", result_heading(&prediction.input).bold());
            for line in prediction.result.display_lines() {
                println!("{}", line);
            }
        }
        OutputFormat::Table => {
            println!("{}", result_heading(&prediction.input).bold());
            let rows: Vec<PollutantRow> = prediction
                .result
                .pairs()
                .map(|(pollutant, value)| PollutantRow {
                    pollutant: pollutant.to_string(),
                    value: format_value(value),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!("Model: {}", prediction.result.model_version.cyan());
        }
    }

    if prediction.report.unknown_station && format != OutputFormat::Json {
        print_warning(&format!(
            "Station {} is not in the model schema; the prediction uses no station information",
            prediction.input.station_id
        ));
    }
    Ok(())
}

/// Print an aligned feature row
pub fn print_row(row: &FeatureRow, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(row)?,
        OutputFormat::Text => {
            for (column, value) in row.iter() {
                println!("{}={}", column, format_feature(value));
            }
        }
        OutputFormat::Table => {
            let cells: Vec<FeatureCell> = row
                .iter()
                .enumerate()
                .map(|(position, (column, value))| FeatureCell {
                    position,
                    column: column.to_string(),
                    value: format_feature(value),
                })
                .collect();
            println!("{}", Table::new(cells).with(Style::rounded()));
        }
    }
    Ok(())
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Two decimals, as shown in the form
pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

/// Feature cells are integral; print them without a fraction
fn format_feature(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
