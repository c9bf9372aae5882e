//! Настройки конвейеров

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::SdcaOptions;
use crate::preprocessing::TextOptions;

/// Переменная окружения с путем к JSON-файлу настроек
pub const CONFIG_ENV: &str = "ML_PIPELINES_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub regression: SdcaOptions,
    #[serde(default)]
    pub classification: SdcaOptions,
    #[serde(default = "default_max_keys")]
    pub one_hot_max_keys: usize,
    #[serde(default)]
    pub text: TextOptions,
}

fn default_seed() -> u64 {
    1
}

fn default_max_keys() -> usize {
    1_000_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            regression: SdcaOptions::default(),
            classification: SdcaOptions::default(),
            one_hot_max_keys: default_max_keys(),
            text: TextOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Файл из `ML_PIPELINES_CONFIG`, иначе значения по умолчанию
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                tracing::info!("Loading config from {:?}", path);
                Self::from_file(Path::new(&path))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.regression.validate("regression")?;
        self.classification.validate("classification")?;
        if self.one_hot_max_keys == 0 {
            return Err(PipelineError::Config("one_hot_max_keys must be positive".to_string()));
        }
        self.text.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            PipelineConfig::from_json(r#"{"seed": 7, "regression": {"l2": 0.5}}"#).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.regression.l2, 0.5);
        assert_eq!(config.regression.max_epochs, SdcaOptions::default().max_epochs);
        assert_eq!(config.classification, SdcaOptions::default());
        assert_eq!(config.one_hot_max_keys, 1_000_000);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(PipelineConfig::from_json(r#"{"classification": {"l2": 0.0}}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"one_hot_max_keys": 0}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"text": {"word_ngram_length": 0}}"#).is_err());
    }

    fn write_config(name: &str, text: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir()
            .join(format!("ml-pipelines-{}-{}", std::process::id(), name));
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_from_file_overrides_and_validates() {
        let path = write_config(
            "config.json",
            r#"{"seed": 42, "classification": {"max_epochs": 50}, "text": {"lowercase": false}}"#,
        );
        let config = PipelineConfig::from_file(&path).unwrap();

        assert_eq!(config.seed, 42);
        assert_eq!(config.classification.max_epochs, 50);
        assert_eq!(config.classification.l2, SdcaOptions::default().l2);
        assert!(!config.text.lowercase);
        assert_eq!(config.regression, SdcaOptions::default());

        let bad = write_config("bad-config.json", r#"{"regression": {"tolerance": -1.0}}"#);
        assert!(matches!(PipelineConfig::from_file(&bad), Err(PipelineError::Config(_))));

        std::fs::remove_file(path).ok();
        std::fs::remove_file(bad).ok();
    }

    #[test]
    fn test_from_file_missing() {
        let err =
            PipelineConfig::from_file(Path::new("/nonexistent/ml-pipelines.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_from_env_reads_named_file() {
        let path = write_config("env-config.json", r#"{"seed": 9}"#);

        std::env::set_var(CONFIG_ENV, &path);
        let from_file = PipelineConfig::from_env();
        std::env::remove_var(CONFIG_ENV);
        let defaults = PipelineConfig::from_env().unwrap();

        assert_eq!(from_file.unwrap().seed, 9);
        assert_eq!(defaults, PipelineConfig::default());

        std::fs::remove_file(path).ok();
    }
}
