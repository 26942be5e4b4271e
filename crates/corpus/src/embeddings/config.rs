//! Embedding configuration types and management.

use alertsbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the embedding configuration inside a corpus directory.
pub const EMBEDDING_CONFIG_FILE: &str = "embedding.yaml";

/// Embedding configuration for a corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "mock", "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Whether to normalize embeddings to unit length
    #[serde(default)]
    pub normalize: bool,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Endpoint override for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            normalize: false,
            batch_size: default_batch_size(),
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    fn config_path(corpus_dir: &Path) -> PathBuf {
        corpus_dir.join(EMBEDDING_CONFIG_FILE)
    }

    /// Load the embedding config of a corpus, falling back to defaults.
    pub fn load(corpus_dir: &Path) -> AppResult<Self> {
        let config_path = Self::config_path(corpus_dir);

        if !config_path.exists() {
            tracing::debug!(
                "No embedding config at {:?}, using defaults",
                config_path
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read embedding config at {:?}: {}",
                config_path, e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!(
                "Failed to parse embedding config at {:?}: {}",
                config_path, e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save the embedding config into a corpus directory.
    pub fn save(&self, corpus_dir: &Path) -> AppResult<()> {
        fs::create_dir_all(corpus_dir).map_err(|e| {
            AppError::Config(format!("Failed to create corpus directory: {}", e))
        })?;

        let config_path = Self::config_path(corpus_dir);
        let yaml = serde_yaml::to_string(self)?;

        fs::write(&config_path, yaml).map_err(|e| {
            AppError::Config(format!(
                "Failed to write embedding config to {:?}: {}",
                config_path, e
            ))
        })?;

        tracing::debug!("Saved embedding config to {:?}", config_path);
        Ok(())
    }

    /// Reject configurations that cannot produce usable vectors.
    pub fn validate(&self) -> AppResult<()> {
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be positive".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batchSize must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate that another config produces vectors comparable to this one.
    ///
    /// Batch size and endpoint do not affect vectors and are ignored.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::IndexUnavailable(format!(
                "Provider mismatch: expected '{}', got '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::IndexUnavailable(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::IndexUnavailable(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions, other.dimensions
            )));
        }

        if self.normalize != other.normalize {
            return Err(AppError::IndexUnavailable(format!(
                "Normalization mismatch: expected {}, got {}",
                self.normalize, other.normalize
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert!(!config.normalize);
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let config = EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            normalize: true,
            batch_size: 16,
            endpoint: Some("http://localhost:11434".to_string()),
        };

        config.save(temp.path()).unwrap();

        let loaded = EmbeddingConfig::load(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = EmbeddingConfig::load(temp.path()).unwrap();
        assert_eq!(loaded, EmbeddingConfig::default());
    }

    #[test]
    fn test_load_camel_case_keys() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(EMBEDDING_CONFIG_FILE),
            "provider: mock\nmodel: mock-v1\ndimensions: 8\nbatchSize: 2\n",
        )
        .unwrap();

        let loaded = EmbeddingConfig::load(temp.path()).unwrap();
        assert_eq!(loaded.batch_size, 2);
        assert!(!loaded.normalize);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let config = EmbeddingConfig {
            dimensions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_consistency_ignores_batch_size() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            batch_size: 7,
            ..config1.clone()
        };
        assert!(config1.validate_consistency(&config2).is_ok());
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            dimensions: 768,
            ..config1.clone()
        };

        let result = config1.validate_consistency(&config2);
        assert!(matches!(result, Err(AppError::IndexUnavailable(_))));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Dimension mismatch"));
    }

    #[test]
    fn test_validate_consistency_normalize_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            normalize: true,
            ..config1.clone()
        };
        assert!(config1.validate_consistency(&config2).is_err());
    }
}
