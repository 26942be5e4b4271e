//! Embedding generation for articles and queries.
//!
//! [`Embedder`] wraps an injected [`EmbeddingProvider`] with the checks every
//! vector must pass before it reaches the index: no empty inputs, one vector
//! per input, the configured dimension, and optional L2 normalization applied
//! the same way at build and query time.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use alertsbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Validating front end to an embedding provider.
#[derive(Debug, Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingConfig,
}

impl Embedder {
    /// Pair a provider with the config it is expected to honour.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingConfig) -> AppResult<Self> {
        config.validate()?;

        if provider.dimensions() != config.dimensions {
            return Err(AppError::Config(format!(
                "Embedding provider '{}' produces {} dimensions, config expects {}",
                provider.provider_name(),
                provider.dimensions(),
                config.dimensions
            )));
        }

        Ok(Self { provider, config })
    }

    /// Create the provider named by `config` and wrap it.
    pub async fn from_config(config: EmbeddingConfig) -> AppResult<Self> {
        tracing::debug!(
            "Creating embedding provider: provider={}, model={}, dimensions={}",
            config.provider,
            config.model,
            config.dimensions
        );

        let provider = create_provider(&config).await?;
        Self::new(provider, config)
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }

    /// Embed texts in order, `batch_size` at a time.
    pub async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(AppError::Embedding(format!(
                "Cannot embed empty text (input {})",
                i
            )));
        }

        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.config.batch_size) {
            let vectors = self.provider.embed_batch(batch).await?;

            if vectors.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Provider '{}' returned {} vectors for {} texts",
                    self.provider.provider_name(),
                    vectors.len(),
                    batch.len()
                )));
            }

            for mut vector in vectors {
                if vector.len() != self.config.dimensions {
                    return Err(AppError::Embedding(format!(
                        "Unexpected embedding dimensions: got {}, expected {}",
                        vector.len(),
                        self.config.dimensions
                    )));
                }

                if self.config.normalize {
                    normalize(&mut vector);
                }

                embeddings.push(vector);
            }
        }

        tracing::debug!(
            "Generated {} embeddings with '{}' (model: {})",
            embeddings.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        Ok(embeddings)
    }
}

/// Scale a vector to unit length. Zero vectors are left unchanged.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;

    fn mock_config(dimensions: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "mock".to_string(),
            model: "mock-v1".to_string(),
            dimensions,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_embedder_trigram_default() {
        let embedder = Embedder::from_config(EmbeddingConfig::default())
            .await
            .unwrap();

        let texts = vec!["visa rules changed".to_string(), "tax deadline".to_string()];
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 384);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_provider() {
        let provider = Arc::new(MockProvider::new(8));
        let embedder = Embedder::new(provider.clone(), mock_config(8)).unwrap();

        let result = embedder.embed("   ").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_wrong_dimension_from_provider() {
        let provider = Arc::new(MockProvider::new(4).with_vector("short", vec![1.0, 0.0]));
        let embedder = Embedder::new(provider, mock_config(4)).unwrap();

        let result = embedder.embed("short").await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[test]
    fn test_provider_config_dimension_mismatch() {
        let provider = Arc::new(MockProvider::new(4));
        assert!(Embedder::new(provider, mock_config(8)).is_err());
    }

    #[tokio::test]
    async fn test_normalize_applied() {
        let provider = Arc::new(MockProvider::new(2).with_vector("v", vec![3.0, 4.0]));
        let config = EmbeddingConfig {
            normalize: true,
            ..mock_config(2)
        };
        let embedder = Embedder::new(provider, config).unwrap();

        let v = embedder.embed("v").await.unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let provider = Arc::new(
            MockProvider::new(1)
                .with_vector("one", vec![1.0])
                .with_vector("two", vec![2.0])
                .with_vector("three", vec![3.0]),
        );
        let config = EmbeddingConfig {
            batch_size: 2,
            ..mock_config(1)
        };
        let embedder = Embedder::new(provider.clone(), config).unwrap();

        let texts: Vec<String> = ["one", "two", "three"].iter().map(|s| s.to_string()).collect();
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors, vec![vec![1.0], vec![2.0], vec![3.0]]);
        assert_eq!(provider.calls(), 3);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
