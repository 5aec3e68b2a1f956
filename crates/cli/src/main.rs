//! Water pollutant predictor CLI
//!
//! Predicts pollutant concentrations for a station and month from the
//! command line, either from flags or by prompting for each value.

mod commands;
mod config;
mod output;
mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{predict, schema};
use pollutant_lib::{
    artifacts::{load_artifacts, ArtifactConfig},
    observability::StructuredLogger,
    predictor::{PredictionService, StationPolicy},
    PredictorError,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Water pollutant predictor CLI
#[derive(Parser)]
#[command(name = "pollutant")]
#[command(author, version, about = "Predict water pollutants based on year, month and station id", long_about = None)]
pub struct Cli {
    /// Model artifact (.onnx or linear .json)
    #[arg(long, global = true, env = "POLLUTANT_MODEL")]
    pub model: Option<PathBuf>,

    /// Column schema artifact
    #[arg(long, global = true, env = "POLLUTANT_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Reject station ids the schema does not know
    #[arg(long, global = true)]
    pub strict: bool,

    /// Output format
    #[arg(long, short, global = true, default_value = "text")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the six pollutants for one input
    Predict {
        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,

        /// Station id
        #[arg(long)]
        station: i64,
    },

    /// Prompt for year, month and station id, then predict
    Interactive,

    /// Print the model's column schema
    Schema,

    /// Print the feature row the model would receive, without predicting
    Align {
        #[arg(long)]
        year: i32,

        #[arg(long)]
        month: u32,

        /// Station id
        #[arg(long)]
        station: i64,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        output::print_error(&format!("{:#}", e));
        std::process::exit(exit_code(&e));
    }
}

/// Exit code when the artifacts could not be loaded. clap already uses 2
/// for usage errors.
const EXIT_ARTIFACTS: i32 = 3;
/// Exit code for a failed request
const EXIT_REQUEST: i32 = 1;

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<PredictorError>() {
        Some(e) if !e.is_request_scoped() => EXIT_ARTIFACTS,
        _ => EXIT_REQUEST,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let artifact_config = ArtifactConfig::new(
        config.resolve_model(cli.model),
        config.resolve_schema(cli.schema),
    );

    if let Commands::Schema = cli.command {
        return schema::show_schema(&artifact_config, cli.format);
    }

    let policy = StationPolicy::from_strict(cli.strict || config.strict_station);
    let service = build_service(&artifact_config, policy)?;

    match cli.command {
        Commands::Predict {
            year,
            month,
            station,
        } => predict::predict(&service, year, month, station, cli.format),
        Commands::Interactive => predict::interactive(&service, cli.format),
        Commands::Align {
            year,
            month,
            station,
        } => predict::align(&service, year, month, station, cli.format),
        Commands::Schema => Ok(()),
    }
}

fn build_service(artifact_config: &ArtifactConfig, policy: StationPolicy) -> Result<PredictionService> {
    let logger = StructuredLogger::new("cli");
    let artifacts = load_artifacts(artifact_config).with_context(|| {
        format!(
            "Failed to load artifacts (model {}, schema {})",
            artifact_config.model_path.display(),
            artifact_config.schema_path.display()
        )
    })?;
    logger.log_artifacts_loaded(artifacts.model.version(), artifacts.schema.columns());

    PredictionService::new(artifacts.schema, artifacts.model, policy, logger)
        .context("Model and schema do not fit together")
}
