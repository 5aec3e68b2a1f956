//! Schema inspection

use anyhow::{Context, Result};
use colored::Colorize;
use pollutant_lib::artifacts::{load_schema, ArtifactConfig};
use tabled::{settings::Style, Table, Tabled};

use crate::output::{print_json, OutputFormat};

#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Column")]
    column: String,
}

/// Print the schema columns in order. The model is not loaded.
pub fn show_schema(config: &ArtifactConfig, format: OutputFormat) -> Result<()> {
    let schema = load_schema(
        &config.schema_path,
        config.schema_sha256.as_deref(),
        config.max_artifact_bytes,
    )
    .with_context(|| format!("Failed to load schema {}", config.schema_path.display()))?;

    match format {
        OutputFormat::Json => print_json(&schema)?,
        OutputFormat::Text => {
            for column in schema.columns() {
                println!("{}", column);
            }
        }
        OutputFormat::Table => {
            let rows: Vec<ColumnRow> = schema
                .columns()
                .iter()
                .enumerate()
                .map(|(position, column)| ColumnRow {
                    position,
                    column: column.clone(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));

            let stations = schema.station_ids();
            println!(
                "{} columns, {} stations",
                schema.len().to_string().cyan(),
                stations.len().to_string().cyan()
            );
        }
    }
    Ok(())
}
