//! ONNX inference using tract
//!
//! Runs regressors exported to ONNX (for example a multi-output
//! scikit-learn model converted with skl2onnx). The graph is optimized once
//! for a `[1, n_columns]` f32 input and then reused read-only.

use super::Regressor;
use crate::error::{PredictorError, Result};
use crate::models::FeatureRow;
use anyhow::Context;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const SLOW_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based regressor
pub struct OnnxRegressor {
    model: TractModel,
    width: usize,
    version: String,
}

impl std::fmt::Debug for OnnxRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxRegressor")
            .field("width", &self.width)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl OnnxRegressor {
    /// Load a model from bytes, fixing its input shape to `[1, width]`
    pub fn new(model_bytes: &[u8], width: usize, version: impl Into<String>) -> Result<Self> {
        let model = Self::load_model(model_bytes, width)
            .map_err(|e| PredictorError::InvalidInput(format!("{:#}", e)))?;
        Ok(Self {
            model,
            width,
            version: version.into(),
        })
    }

    /// Load and optimize an ONNX model from bytes
    fn load_model(model_bytes: &[u8], width: usize) -> anyhow::Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, width]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    /// Convert feature row to tensor input
    fn row_to_tensor(&self, row: &FeatureRow) -> Result<Tensor> {
        let array = tract_ndarray::Array2::from_shape_vec((1, self.width), row.to_f32_vec())
            .map_err(|e| PredictorError::ModelInvocation(e.to_string()))?;
        Ok(array.into())
    }

    fn run(&self, row: &FeatureRow) -> anyhow::Result<Vec<f64>> {
        let input = self.row_to_tensor(row)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let output = output.cast_to::<f32>()?;
        let view = output.to_array_view::<f32>()?;
        Ok(view.iter().map(|v| *v as f64).collect())
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, row: &FeatureRow) -> Result<Vec<f64>> {
        if row.len() != self.width {
            return Err(PredictorError::ModelInvocation(format!(
                "model expects {} features, row has {}",
                self.width,
                row.len()
            )));
        }

        let start = Instant::now();
        let values = self
            .run(row)
            .map_err(|e| PredictorError::ModelInvocation(format!("{:#}", e)))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > SLOW_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms", SLOW_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(values)
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::StructuredLogger;
    use crate::predictor::{FeatureAligner, PredictionService, StationPolicy};
    use crate::schema::training_schema;
    use crate::models::{Pollutant, RawInput};
    use prost::Message;
    use std::sync::Arc;
    use tract_onnx::pb::{
        tensor_proto::DataType, tensor_shape_proto::dimension, tensor_shape_proto::Dimension,
        type_proto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
        TensorShapeProto, TypeProto, ValueInfoProto,
    };

    fn float_value(name: &str, dims: &[i64]) -> ValueInfoProto {
        let dim = dims
            .iter()
            .map(|d| Dimension {
                value: Some(dimension::Value::DimValue(*d)),
                ..Default::default()
            })
            .collect();
        ValueInfoProto {
            name: name.to_string(),
            r#type: Some(TypeProto {
                value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                    elem_type: DataType::Float as i32,
                    shape: Some(TensorShapeProto { dim }),
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn float_tensor(name: &str, dims: &[i64], data: Vec<f32>) -> TensorProto {
        TensorProto {
            name: name.to_string(),
            dims: dims.to_vec(),
            data_type: DataType::Float as i32,
            float_data: data,
            ..Default::default()
        }
    }

    /// `y = x · weights + bias` over `width` inputs, serialized as ONNX
    fn linear_onnx(width: usize, weights: Vec<f32>, bias: Vec<f32>) -> Vec<u8> {
        let outputs = bias.len() as i64;
        let node = |op: &str, inputs: [&str; 2], output: &str| NodeProto {
            op_type: op.to_string(),
            input: inputs.iter().map(|s| s.to_string()).collect(),
            output: vec![output.to_string()],
            ..Default::default()
        };

        let graph = GraphProto {
            name: "pollutants".to_string(),
            node: vec![
                node("MatMul", ["features", "weights"], "scores"),
                node("Add", ["scores", "bias"], "pollutants"),
            ],
            initializer: vec![
                float_tensor("weights", &[width as i64, outputs], weights),
                float_tensor("bias", &[outputs], bias),
            ],
            input: vec![float_value("features", &[1, width as i64])],
            output: vec![float_value("pollutants", &[1, outputs])],
            ..Default::default()
        };

        ModelProto {
            ir_version: 7,
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            graph: Some(graph),
            ..Default::default()
        }
        .encode_to_vec()
    }

    /// O2 = 8 + 0.001 * year + 2 * id_1, the other five constant 1..=5
    fn pollutant_onnx(outputs: usize) -> Vec<u8> {
        let width = 24;
        let mut weights = vec![0.0f32; width * outputs];
        weights[0] = 0.001;
        weights[2 * outputs] = 2.0;
        let mut bias: Vec<f32> = (0..outputs).map(|i| i as f32).collect();
        bias[0] = 8.0;
        linear_onnx(width, weights, bias)
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let result = OnnxRegressor::new(b"definitely not an onnx graph", 24, "v1");
        assert!(matches!(result, Err(PredictorError::InvalidInput(_))));
    }

    #[test]
    fn test_onnx_predicts_six_values_in_order() {
        let model = OnnxRegressor::new(&pollutant_onnx(6), 24, "onnx-test").unwrap();
        assert_eq!(model.input_width(), Some(24));

        let aligner = FeatureAligner::new(Arc::new(training_schema()));
        let (row, _) = aligner.align(&RawInput::new(2025, 6, 1)).unwrap();
        let out = model.predict(&row).unwrap();

        assert_eq!(out.len(), 6);
        assert!((out[0] - 12.025).abs() < 1e-4);
        assert_eq!(&out[1..], &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_onnx_rejects_row_of_wrong_width() {
        let model = OnnxRegressor::new(&pollutant_onnx(6), 24, "onnx-test").unwrap();
        let row = FeatureRow::from_parts(vec!["year".into()], vec![2025.0]);
        assert!(matches!(
            model.predict(&row),
            Err(PredictorError::ModelInvocation(_))
        ));
    }

    #[test]
    fn test_onnx_through_service() {
        let model = OnnxRegressor::new(&pollutant_onnx(6), 24, "onnx-test").unwrap();
        let svc = PredictionService::new(
            Arc::new(training_schema()),
            Arc::new(model),
            StationPolicy::ZeroFill,
            StructuredLogger::new("test"),
        )
        .unwrap();

        let prediction = svc.predict(&RawInput::new(2025, 6, 2)).unwrap();
        // id_1 is 0 for station 2
        assert!((prediction.result.get(Pollutant::O2) - 10.025).abs() < 1e-4);
        assert_eq!(prediction.result.get(Pollutant::Cl), 5.0);
        assert_eq!(prediction.result.model_version, "onnx-test");
    }

    #[test]
    fn test_onnx_short_output_is_model_invocation_error() {
        let model = OnnxRegressor::new(&pollutant_onnx(4), 24, "onnx-short").unwrap();
        let svc = PredictionService::new(
            Arc::new(training_schema()),
            Arc::new(model),
            StationPolicy::ZeroFill,
            StructuredLogger::new("test"),
        )
        .unwrap();

        let err = svc.predict(&RawInput::new(2025, 6, 1)).unwrap_err();
        assert!(matches!(err, PredictorError::ModelInvocation(_)));
    }
}
