//! Prediction service
//!
//! Owns the loaded schema and model and runs one alignment plus one model
//! call per request. Both artifacts are shared read-only.

use super::{AlignmentReport, FeatureAligner, OutputFormatter, Regressor, StationPolicy};
use crate::error::{PredictorError, Result};
use crate::models::{FeatureRow, PredictionResult, RawInput};
use crate::observability::{PredictorMetrics, StructuredLogger};
use crate::schema::SchemaColumns;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a single prediction request
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub input: RawInput,
    pub row: FeatureRow,
    pub report: AlignmentReport,
    pub result: PredictionResult,
}

pub struct PredictionService {
    aligner: FeatureAligner,
    model: Arc<dyn Regressor>,
    formatter: OutputFormatter,
    metrics: PredictorMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    /// Wire a schema and model together, rejecting a model built for a
    /// different number of columns
    pub fn new(
        schema: Arc<SchemaColumns>,
        model: Arc<dyn Regressor>,
        policy: StationPolicy,
        logger: StructuredLogger,
    ) -> Result<Self> {
        if let Some(width) = model.input_width() {
            if width != schema.len() {
                return Err(PredictorError::SchemaMismatch {
                    expected: format!("{} model inputs", width),
                    actual: format!("{} schema columns", schema.len()),
                });
            }
        }

        let metrics = PredictorMetrics::new();
        metrics.set_schema_width(schema.len() as i64);
        metrics.set_model_version(model.version());

        Ok(Self {
            aligner: FeatureAligner::with_policy(schema, policy),
            model,
            formatter: OutputFormatter::new(),
            metrics,
            logger,
        })
    }

    pub fn schema(&self) -> &SchemaColumns {
        self.aligner.schema()
    }

    pub fn policy(&self) -> StationPolicy {
        self.aligner.policy()
    }

    pub fn model_version(&self) -> &str {
        self.model.version()
    }

    /// Align only, without invoking the model
    pub fn align(&self, input: &RawInput) -> Result<(FeatureRow, AlignmentReport)> {
        self.aligner.align(input)
    }

    /// Align the input and run the model on it
    pub fn predict(&self, input: &RawInput) -> Result<Prediction> {
        let start = Instant::now();

        match self.run(input) {
            Ok(prediction) => {
                let elapsed = start.elapsed();
                self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
                self.metrics.inc_predictions_generated();
                self.logger.log_prediction(
                    input,
                    &prediction.result,
                    elapsed.as_micros() as u64,
                );
                Ok(prediction)
            }
            Err(e) => {
                self.metrics.inc_prediction_errors();
                self.logger.log_prediction_failure(input, &e);
                Err(e)
            }
        }
    }

    fn run(&self, input: &RawInput) -> Result<Prediction> {
        let (row, report) = self.aligner.align(input)?;
        if report.unknown_station {
            self.metrics.inc_unknown_stations();
        }

        self.aligner.schema().check_layout(row.columns())?;

        let raw = self.model.predict(&row)?;
        let result = self.formatter.format(&raw, self.model.version())?;

        Ok(Prediction {
            input: *input,
            row,
            report,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pollutant;
    use crate::schema::training_schema;

    /// Returns year/100, month, the active station index and three constants
    struct EchoModel {
        outputs: usize,
    }

    impl Regressor for EchoModel {
        fn predict(&self, row: &FeatureRow) -> Result<Vec<f64>> {
            let station = row
                .iter()
                .position(|(c, v)| c.starts_with("id_") && v == 1.0)
                .map(|idx| idx as f64)
                .unwrap_or(-1.0);
            let mut out = vec![
                row.get("year").unwrap_or_default() / 100.0,
                row.get("month").unwrap_or_default(),
                station,
                1.0,
                2.0,
                3.0,
            ];
            out.truncate(self.outputs);
            Ok(out)
        }

        fn input_width(&self) -> Option<usize> {
            Some(24)
        }

        fn version(&self) -> &str {
            "echo"
        }
    }

    struct FailingModel;

    impl Regressor for FailingModel {
        fn predict(&self, _row: &FeatureRow) -> Result<Vec<f64>> {
            Err(PredictorError::ModelInvocation("shape mismatch".into()))
        }

        fn input_width(&self) -> Option<usize> {
            None
        }

        fn version(&self) -> &str {
            "failing"
        }
    }

    fn service(model: Arc<dyn Regressor>, policy: StationPolicy) -> PredictionService {
        PredictionService::new(
            Arc::new(training_schema()),
            model,
            policy,
            StructuredLogger::new("test"),
        )
        .unwrap()
    }

    #[test]
    fn test_prediction_has_six_values() {
        let svc = service(Arc::new(EchoModel { outputs: 6 }), StationPolicy::ZeroFill);
        let prediction = svc.predict(&RawInput::new(2025, 6, 1)).unwrap();

        assert_eq!(prediction.result.values.len(), 6);
        assert_eq!(prediction.result.get(Pollutant::O2), 20.25);
        assert_eq!(prediction.result.get(Pollutant::No3), 6.0);
        // id_1 sits right after year and month
        assert_eq!(prediction.result.get(Pollutant::No2), 2.0);
        assert_eq!(prediction.result.model_version, "echo");
        assert_eq!(prediction.result.display_lines()[0], "O2: 20.25");
    }

    #[test]
    fn test_unknown_station_still_predicts() {
        let svc = service(Arc::new(EchoModel { outputs: 6 }), StationPolicy::ZeroFill);
        let prediction = svc.predict(&RawInput::new(2025, 6, 40)).unwrap();

        assert!(prediction.report.unknown_station);
        assert_eq!(prediction.result.get(Pollutant::No2), -1.0);
        assert_eq!(prediction.result.values.len(), 6);
    }

    #[test]
    fn test_unknown_station_rejected_in_strict_mode() {
        let svc = service(Arc::new(EchoModel { outputs: 6 }), StationPolicy::Reject);
        let err = svc.predict(&RawInput::new(2025, 6, 40)).unwrap_err();
        assert!(matches!(err, PredictorError::UnknownStation { station_id: 40 }));
    }

    #[test]
    fn test_model_failure_propagates() {
        let svc = service(Arc::new(FailingModel), StationPolicy::ZeroFill);
        let err = svc.predict(&RawInput::new(2025, 6, 1)).unwrap_err();
        assert!(matches!(err, PredictorError::ModelInvocation(_)));
        assert!(err.is_request_scoped());
    }

    #[test]
    fn test_short_model_output_is_error() {
        let svc = service(Arc::new(EchoModel { outputs: 4 }), StationPolicy::ZeroFill);
        assert!(svc.predict(&RawInput::new(2025, 6, 1)).is_err());
    }

    #[test]
    fn test_width_mismatch_rejected_at_construction() {
        let schema = SchemaColumns::new(vec!["year".into(), "month".into(), "id_1".into()]).unwrap();
        let result = PredictionService::new(
            Arc::new(schema),
            Arc::new(EchoModel { outputs: 6 }),
            StationPolicy::ZeroFill,
            StructuredLogger::new("test"),
        );
        assert!(matches!(result, Err(PredictorError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_align_does_not_invoke_model() {
        let svc = service(Arc::new(FailingModel), StationPolicy::ZeroFill);
        let (row, _) = svc.align(&RawInput::new(2025, 6, 3)).unwrap();
        assert_eq!(row.get("id_3"), Some(1.0));
    }
}
