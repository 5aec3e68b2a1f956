//! Observability infrastructure for the predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction and error counts,
//!   schema width, model version)
//! - Structured logging of predictor events with tracing

use crate::error::PredictorError;
use crate::models::{PredictionResult, RawInput};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_gauge, GaugeVec,
    Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_generated: IntCounter,
    prediction_errors: IntCounter,
    unknown_stations: IntCounter,
    schema_columns: IntGauge,
    model_version_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "pollutant_prediction_latency_seconds",
                "Time spent aligning features and running the model",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_generated: register_int_counter!(
                "pollutant_predictions_generated_total",
                "Total number of predictions generated"
            )
            .expect("Failed to register predictions_generated"),

            prediction_errors: register_int_counter!(
                "pollutant_prediction_errors_total",
                "Total number of failed prediction requests"
            )
            .expect("Failed to register prediction_errors"),

            unknown_stations: register_int_counter!(
                "pollutant_unknown_station_requests_total",
                "Requests whose station id has no column in the model schema"
            )
            .expect("Failed to register unknown_stations"),

            schema_columns: register_int_gauge!(
                "pollutant_schema_columns",
                "Number of columns in the loaded feature schema"
            )
            .expect("Failed to register schema_columns"),

            model_version_info: register_gauge_vec!(
                "pollutant_model_version_info",
                "Information about the currently loaded model",
                &["version"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Predictor metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions_generated(&self) {
        self.inner().predictions_generated.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn inc_unknown_stations(&self) {
        self.inner().unknown_stations.inc();
    }

    pub fn set_schema_width(&self, columns: i64) {
        self.inner().schema_columns.set(columns);
    }

    /// Update model version info
    pub fn set_model_version(&self, version: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version])
            .set(1.0);
    }
}

/// Structured logger for predictor events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "predictor_started",
            instance = %self.instance,
            version = %version,
            "Pollutant predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "predictor_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Pollutant predictor shutting down"
        );
    }

    /// Log the loaded artifacts, including the full column list for diagnosis
    pub fn log_artifacts_loaded(&self, model_version: &str, columns: &[String]) {
        info!(
            event = "artifacts_loaded",
            instance = %self.instance,
            model_version = %model_version,
            schema_columns = columns.len(),
            "Model and schema artifacts loaded"
        );
        debug!(
            event = "schema_columns",
            instance = %self.instance,
            columns = ?columns,
            "Model schema"
        );
    }

    pub fn log_prediction(&self, input: &RawInput, result: &PredictionResult, elapsed_us: u64) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            year = input.year,
            month = input.month,
            station_id = input.station_id,
            values = ?result.values,
            model_version = %result.model_version,
            elapsed_us = elapsed_us,
            "Generated pollutant prediction"
        );
    }

    pub fn log_prediction_failure(&self, input: &RawInput, error: &PredictorError) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            year = input.year,
            month = input.month,
            station_id = input.station_id,
            error = %error,
            "Prediction request failed"
        );
    }
}
