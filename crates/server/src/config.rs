//! Server configuration

use anyhow::{Context, Result};
use pollutant_lib::artifacts::{ArtifactConfig, MAX_ARTIFACT_BYTES};
use pollutant_lib::predictor::StationPolicy;
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming an optional configuration file
pub const CONFIG_FILE_ENV: &str = "POLLUTANT_CONFIG";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Model artifact (.onnx or linear .json)
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Column schema artifact (.json array or one name per line)
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    #[serde(default)]
    pub model_sha256: Option<String>,

    #[serde(default)]
    pub schema_sha256: Option<String>,

    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,

    /// Port serving the form and health/metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Reject stations the schema does not know instead of zero-filling
    #[serde(default)]
    pub strict_station: bool,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("prediction_model.onnx")
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("model_columns.json")
}

fn default_max_artifact_bytes() -> u64 {
    MAX_ARTIFACT_BYTES
}

fn default_api_port() -> u16 {
    8501
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            schema_path: default_schema_path(),
            model_sha256: None,
            schema_sha256: None,
            max_artifact_bytes: default_max_artifact_bytes(),
            api_port: default_api_port(),
            strict_station: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the optional config file, then `POLLUTANT_*`
    /// environment variables
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::from(PathBuf::from(path)).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("POLLUTANT").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn artifact_config(&self) -> ArtifactConfig {
        ArtifactConfig {
            model_path: self.model_path.clone(),
            schema_path: self.schema_path.clone(),
            model_sha256: self.model_sha256.clone(),
            schema_sha256: self.schema_sha256.clone(),
            max_artifact_bytes: self.max_artifact_bytes,
        }
    }

    pub fn station_policy(&self) -> StationPolicy {
        StationPolicy::from_strict(self.strict_station)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.api_port, 8501);
        assert_eq!(config.model_path, PathBuf::from("prediction_model.onnx"));
        assert_eq!(config.station_policy(), StationPolicy::ZeroFill);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig = config::Config::builder()
            .set_override("api_port", 9000)
            .unwrap()
            .set_override("strict_station", true)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api_port, 9000);
        assert_eq!(config.schema_path, PathBuf::from("model_columns.json"));
        assert_eq!(config.station_policy(), StationPolicy::Reject);
    }

    #[test]
    fn test_artifact_config_carries_checksums() {
        let config = ServerConfig {
            model_sha256: Some("abc".to_string()),
            ..ServerConfig::default()
        };
        let artifacts = config.artifact_config();
        assert_eq!(artifacts.model_sha256.as_deref(), Some("abc"));
        assert_eq!(artifacts.schema_sha256, None);
    }
}
