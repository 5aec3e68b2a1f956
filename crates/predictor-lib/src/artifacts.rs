//! Loading of the model and schema artifacts
//!
//! Both artifacts are read once at startup. Loading validates size, an
//! optional SHA-256 checksum and the artifact contents; any failure is an
//! `ArtifactLoad` error and the process is not expected to continue.

use crate::error::{PredictorError, Result};
use crate::predictor::{LinearRegressor, OnnxRegressor, Regressor};
use crate::schema::SchemaColumns;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Largest artifact accepted (64 MiB)
pub const MAX_ARTIFACT_BYTES: u64 = 64 * 1024 * 1024;

/// Where to find the artifacts and how to verify them
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub model_path: PathBuf,
    pub schema_path: PathBuf,
    /// Expected SHA-256 of the model file (hex)
    pub model_sha256: Option<String>,
    /// Expected SHA-256 of the schema file (hex)
    pub schema_sha256: Option<String>,
    pub max_artifact_bytes: u64,
}

impl ArtifactConfig {
    pub fn new(model_path: impl Into<PathBuf>, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            schema_path: schema_path.into(),
            model_sha256: None,
            schema_sha256: None,
            max_artifact_bytes: MAX_ARTIFACT_BYTES,
        }
    }
}

/// Supported model artifact encodings, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Onnx,
    LinearJson,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("onnx") => Ok(ModelFormat::Onnx),
            Some("json") => Ok(ModelFormat::LinearJson),
            other => Err(PredictorError::artifact(
                path,
                format!("unsupported model format {:?}, expected .onnx or .json", other),
            )),
        }
    }
}

/// The schema and model, loaded once and shared read-only
#[derive(Clone)]
pub struct LoadedArtifacts {
    pub schema: Arc<SchemaColumns>,
    pub model: Arc<dyn Regressor>,
}

/// Load the schema first, then the model sized to it
pub fn load_artifacts(config: &ArtifactConfig) -> Result<LoadedArtifacts> {
    let schema = load_schema(
        &config.schema_path,
        config.schema_sha256.as_deref(),
        config.max_artifact_bytes,
    )?;
    let model = load_model(
        &config.model_path,
        config.model_sha256.as_deref(),
        schema.len(),
        config.max_artifact_bytes,
    )?;

    info!(
        model = %config.model_path.display(),
        schema = %config.schema_path.display(),
        columns = schema.len(),
        model_version = %model.version(),
        "Artifacts loaded"
    );

    Ok(LoadedArtifacts {
        schema: Arc::new(schema),
        model,
    })
}

/// Load a column schema: a JSON array of strings for `.json` files,
/// otherwise one column per line with blank lines and `#` comments skipped
pub fn load_schema(path: &Path, checksum: Option<&str>, max_bytes: u64) -> Result<SchemaColumns> {
    let bytes = read_artifact(path, checksum, max_bytes)?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let columns = if is_json {
        parse_json_schema(&bytes).map_err(|reason| PredictorError::artifact(path, reason))?
    } else {
        parse_text_schema(&bytes).map_err(|reason| PredictorError::artifact(path, reason))?
    };

    SchemaColumns::new(columns).map_err(|e| PredictorError::artifact(path, e))
}

fn parse_json_schema(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    serde_json::from_slice::<Vec<String>>(bytes)
        .map_err(|e| format!("schema must be a JSON array of column names: {}", e))
}

fn parse_text_schema(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("schema is not UTF-8: {}", e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Load a model artifact built for `width` input columns
pub fn load_model(
    path: &Path,
    checksum: Option<&str>,
    width: usize,
    max_bytes: u64,
) -> Result<Arc<dyn Regressor>> {
    let format = ModelFormat::from_path(path)?;
    let bytes = read_artifact(path, checksum, max_bytes)?;

    let model: Arc<dyn Regressor> = match format {
        ModelFormat::Onnx => {
            let version = onnx_version(path, &bytes);
            Arc::new(
                OnnxRegressor::new(&bytes, width, version)
                    .map_err(|e| PredictorError::artifact(path, e))?,
            )
        }
        ModelFormat::LinearJson => Arc::new(
            LinearRegressor::from_json(&bytes).map_err(|e| PredictorError::artifact(path, e))?,
        ),
    };

    debug!(path = %path.display(), ?format, version = %model.version(), "Model loaded");
    Ok(model)
}

/// `<file stem>@<first 12 hex digits of the checksum>`
fn onnx_version(path: &Path, bytes: &[u8]) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model");
    let checksum = compute_checksum(bytes);
    format!("{}@{}", stem, &checksum[..12])
}

/// Read an artifact, enforcing the size limit and the optional checksum
fn read_artifact(path: &Path, checksum: Option<&str>, max_bytes: u64) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path).map_err(|e| PredictorError::artifact(path, e))?;
    if metadata.len() > max_bytes {
        return Err(PredictorError::artifact(
            path,
            format!("size {} exceeds maximum {}", metadata.len(), max_bytes),
        ));
    }

    let bytes = fs::read(path).map_err(|e| PredictorError::artifact(path, e))?;

    if let Some(expected) = checksum {
        let computed = compute_checksum(&bytes);
        if !computed.eq_ignore_ascii_case(expected.trim()) {
            return Err(PredictorError::artifact(
                path,
                format!("checksum mismatch: expected {}, got {}", expected, computed),
            ));
        }
        debug!(path = %path.display(), checksum = %computed, "Artifact checksum validated");
    }

    Ok(bytes)
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureRow;
    use tempfile::TempDir;

    fn training_columns() -> Vec<String> {
        let mut columns = vec!["year".to_string(), "month".to_string()];
        columns.extend((1..=22).map(|i| format!("id_{}", i)));
        columns
    }

    fn write(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn linear_model_json(width: usize) -> Vec<u8> {
        serde_json::json!({
            "version": "linear-test",
            "coefficients": vec![vec![0.001; width]; 6],
            "intercepts": [8.0, 1.0, 0.1, 20.0, 0.2, 30.0],
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_compute_checksum() {
        assert_eq!(
            compute_checksum(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_load_json_schema() {
        let dir = TempDir::new().unwrap();
        let json = serde_json::to_vec(&training_columns()).unwrap();
        let path = write(&dir, "model_columns.json", &json);

        let schema = load_schema(&path, None, MAX_ARTIFACT_BYTES).unwrap();
        assert_eq!(schema.columns(), training_columns().as_slice());
    }

    #[test]
    fn test_load_text_schema_skips_comments() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "columns.txt", b"# exported columns\nyear\n\nmonth\nid_1\n");

        let schema = load_schema(&path, None, MAX_ARTIFACT_BYTES).unwrap();
        assert_eq!(schema.columns(), &["year", "month", "id_1"]);
    }

    #[test]
    fn test_missing_schema_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        let err = load_schema(&dir.path().join("absent.json"), None, MAX_ARTIFACT_BYTES)
            .unwrap_err();
        assert!(matches!(err, PredictorError::ArtifactLoad { .. }));
        assert!(!err.is_request_scoped());
    }

    #[test]
    fn test_corrupt_schema_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "model_columns.json", b"{\"year\": 1}");
        assert!(matches!(
            load_schema(&path, None, MAX_ARTIFACT_BYTES),
            Err(PredictorError::ArtifactLoad { .. })
        ));

        let dup = write(&dir, "dup.json", br#"["year","year"]"#);
        assert!(matches!(
            load_schema(&dup, None, MAX_ARTIFACT_BYTES),
            Err(PredictorError::ArtifactLoad { .. })
        ));
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let json = serde_json::to_vec(&training_columns()).unwrap();
        let path = write(&dir, "model_columns.json", &json);

        let good = compute_checksum(&json);
        assert!(load_schema(&path, Some(&good.to_uppercase()), MAX_ARTIFACT_BYTES).is_ok());

        let err = load_schema(&path, Some("deadbeef"), MAX_ARTIFACT_BYTES).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_oversized_artifact_rejected() {
        let dir = TempDir::new().unwrap();
        let json = serde_json::to_vec(&training_columns()).unwrap();
        let path = write(&dir, "model_columns.json", &json);
        let err = load_schema(&path, None, 8).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_model_format_from_extension() {
        assert_eq!(
            ModelFormat::from_path(Path::new("m.onnx")).unwrap(),
            ModelFormat::Onnx
        );
        assert_eq!(
            ModelFormat::from_path(Path::new("m.JSON")).unwrap(),
            ModelFormat::LinearJson
        );
        assert!(ModelFormat::from_path(Path::new("prediction_model.pkl")).is_err());
    }

    #[test]
    fn test_load_artifacts_linear() {
        let dir = TempDir::new().unwrap();
        let schema_path = write(
            &dir,
            "model_columns.json",
            &serde_json::to_vec(&training_columns()).unwrap(),
        );
        let model_path = write(&dir, "prediction_model.json", &linear_model_json(24));

        let artifacts = load_artifacts(&ArtifactConfig::new(&model_path, &schema_path)).unwrap();
        assert_eq!(artifacts.schema.len(), 24);
        assert_eq!(artifacts.model.version(), "linear-test");
        assert_eq!(artifacts.model.input_width(), Some(24));

        let row = FeatureRow::from_parts(training_columns(), vec![0.0; 24]);
        let out = artifacts.model.predict(&row).unwrap();
        assert_eq!(out, vec![8.0, 1.0, 0.1, 20.0, 0.2, 30.0]);
    }

    #[test]
    fn test_invalid_onnx_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        let model_path = write(&dir, "prediction_model.onnx", b"\x00\x01garbage");
        let result = load_model(&model_path, None, 24, MAX_ARTIFACT_BYTES);
        assert!(matches!(result, Err(PredictorError::ArtifactLoad { .. })));
    }
}
