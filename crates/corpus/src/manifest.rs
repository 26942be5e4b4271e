//! Corpus manifest: the record pairing an article store with its index.

use crate::embeddings::EmbeddingConfig;
use alertsbot_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Metric identifier written to every manifest.
pub const METRIC_L2_SQUARED: &str = "l2_squared";

/// Embedding settings the index was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEmbedding {
    pub provider: String,
    pub model: String,
    pub normalize: bool,
}

/// SHA-256 digests (lowercase hex) of the two artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checksums {
    pub articles: String,
    pub index: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusManifest {
    pub build_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub article_count: usize,
    pub dimension: usize,
    pub metric: String,
    pub embedding: ManifestEmbedding,
    pub checksums: Checksums,
}

impl CorpusManifest {
    pub fn new(
        build_id: Uuid,
        article_count: usize,
        config: &EmbeddingConfig,
        checksums: Checksums,
    ) -> Self {
        Self {
            build_id,
            created_at: Utc::now(),
            article_count,
            dimension: config.dimensions,
            metric: METRIC_L2_SQUARED.to_string(),
            embedding: ManifestEmbedding {
                provider: config.provider.clone(),
                model: config.model.clone(),
                normalize: config.normalize,
            },
            checksums,
        }
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::IndexUnavailable(format!("Cannot read manifest {:?}: {}", path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            AppError::IndexUnavailable(format!("Corrupt manifest {:?}: {}", path, e))
        })
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Embedding config equivalent to the one the corpus was built with.
    ///
    /// Batch size is not recorded and takes its default.
    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: self.embedding.provider.clone(),
            model: self.embedding.model.clone(),
            dimensions: self.dimension,
            normalize: self.embedding.normalize,
            ..Default::default()
        }
    }

    /// Reject a query-time embedder that would not produce comparable vectors.
    pub fn check_embedding(&self, config: &EmbeddingConfig) -> AppResult<()> {
        self.embedding_config().validate_consistency(config)
    }
}

/// SHA-256 of a file, lowercase hex.
pub fn sha256_file(path: &Path) -> AppResult<String> {
    let bytes = fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Verify a file against an expected digest.
pub fn verify_checksum(path: &Path, expected: &str) -> AppResult<()> {
    let actual = sha256_file(path).map_err(|e| {
        AppError::IndexUnavailable(format!("Cannot checksum {:?}: {}", path, e))
    })?;

    if actual != expected {
        return Err(AppError::IndexUnavailable(format!(
            "Checksum mismatch for {:?}: manifest has {}, file has {}",
            path, expected, actual
        )));
    }

    Ok(())
}
