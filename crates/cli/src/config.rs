//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defaults used when no flag or environment variable names an artifact
pub const DEFAULT_MODEL_PATH: &str = "prediction_model.onnx";
pub const DEFAULT_SCHEMA_PATH: &str = "model_columns.json";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Model artifact path
    pub model_path: Option<PathBuf>,
    /// Column schema artifact path
    pub schema_path: Option<PathBuf>,
    /// Reject stations unknown to the schema
    #[serde(default)]
    pub strict_station: bool,
}

impl Config {
    /// Load configuration from the user config file, if there is one
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// `~/.config/pollutant/config.json`
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("pollutant").join("config.json"))
    }

    /// Pick the flag value, then the config file, then the built-in default
    pub fn resolve_model(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.model_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
    }

    pub fn resolve_schema(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.schema_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.model_path.is_none());
        assert_eq!(config.resolve_model(None), PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_flag_beats_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model_path": "from_file.json", "schema_path": "cols.txt"}"#)
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.resolve_model(None), PathBuf::from("from_file.json"));
        assert_eq!(
            config.resolve_model(Some(PathBuf::from("flag.onnx"))),
            PathBuf::from("flag.onnx")
        );
        assert_eq!(config.resolve_schema(None), PathBuf::from("cols.txt"));
        assert!(!config.strict_station);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
