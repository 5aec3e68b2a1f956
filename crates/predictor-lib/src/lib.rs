//! Core library for water pollutant prediction
//!
//! This crate provides:
//! - Loading of the model and column-schema artifacts
//! - Feature alignment of raw form input against the training schema
//! - Model inference (ONNX via tract, or a JSON linear regressor)
//! - Health checks and observability

pub mod artifacts;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod schema;

pub use error::{PredictorError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use schema::SchemaColumns;
