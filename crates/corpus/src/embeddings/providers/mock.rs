//! Mock embedding provider for tests and offline development.

use crate::embeddings::provider::EmbeddingProvider;
use alertsbot_core::AppResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Deterministic bag-of-words provider.
///
/// Each lowercase alphanumeric word adds `1.0` to the dimension its FNV-1a
/// hash selects; vectors are not normalized. Individual texts can be pinned to
/// exact vectors with [`MockProvider::with_vector`], and every embedded text
/// is counted so tests can assert the provider was never reached.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
    fixed: HashMap<String, Vec<f32>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fixed: HashMap::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `vector` verbatim whenever `text` is embedded.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixed.insert(text.into(), vector);
        self
    }

    /// Sleep before answering every batch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bag_of_words(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let idx = (fnv1a(word.as_bytes()) % self.dimensions as u64) as usize;
            embedding[idx] += 1.0;
        }

        embedding
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |acc, &b| {
        (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.fetch_add(texts.len(), Ordering::SeqCst);

        Ok(texts
            .iter()
            .map(|text| {
                self.fixed
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| self.bag_of_words(text))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_dimensions() {
        let provider = MockProvider::new(64);
        assert_eq!(provider.dimensions(), 64);
        assert_eq!(provider.provider_name(), "mock");

        let embedding = provider.embed("visa rules changed").await.unwrap();
        assert_eq!(embedding.len(), 64);
        assert_eq!(embedding.iter().sum::<f32>(), 3.0);
    }

    #[tokio::test]
    async fn test_mock_provider_fixed_vector() {
        let provider = MockProvider::new(2).with_vector("north", vec![0.0, 1.0]);
        let embedding = provider.embed("north").await.unwrap();
        assert_eq!(embedding, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_mock_provider_counts_calls() {
        let provider = MockProvider::new(8);
        assert_eq!(provider.calls(), 0);

        provider
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_provider_deterministic() {
        let provider = MockProvider::new(32);
        let e1 = provider.embed("tax deadline extended").await.unwrap();
        let e2 = provider.embed("Tax deadline, extended!").await.unwrap();
        assert_eq!(e1, e2);
    }
}
