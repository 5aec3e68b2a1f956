//! Error taxonomy for the predictor

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictorError>;

#[derive(Debug, Error)]
pub enum PredictorError {
    /// A model or schema artifact could not be read, verified or parsed
    #[error("failed to load artifact {path:?}: {reason}")]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Station id has no one-hot column in the schema (strict policy only)
    #[error("station id {station_id} is not part of the model schema")]
    UnknownStation { station_id: i64 },

    #[error("feature layout mismatch: expected {expected}, got {actual}")]
    SchemaMismatch { expected: String, actual: String },

    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PredictorError {
    pub fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors that abort a single request rather than the process
    pub fn is_request_scoped(&self) -> bool {
        !matches!(self, PredictorError::ArtifactLoad { .. })
    }
}
