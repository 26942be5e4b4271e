//! Query-time retrieval: embed the query, search the index, map hits back to
//! articles.

use crate::corpus::Corpus;
use crate::embeddings::config::EMBEDDING_CONFIG_FILE;
use crate::embeddings::{Embedder, EmbeddingConfig};
use crate::store::ArticleStore;
use crate::types::{Article, ScoredArticle};
use crate::vector_index::{Neighbor, VectorIndex};
use alertsbot_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Everything a retrieval call needs, built once per process.
///
/// Cheap to clone; the corpus is shared and read-only.
#[derive(Debug, Clone)]
pub struct RetrievalContext {
    corpus: Arc<Corpus>,
    embedder: Embedder,
}

impl RetrievalContext {
    /// Pair a loaded corpus with a query embedder.
    ///
    /// Fails with `IndexUnavailable` if the embedder would produce vectors
    /// that are not comparable with the ones in the index.
    pub fn new(corpus: Arc<Corpus>, embedder: Embedder) -> AppResult<Self> {
        corpus
            .embedding_config()
            .validate_consistency(embedder.config())?;

        Ok(Self { corpus, embedder })
    }

    /// Load the corpus in `dir` and create the embedder it was built with.
    ///
    /// `embedding.yaml` in the corpus directory supplies runtime settings
    /// such as the endpoint; without it the manifest's settings are used.
    pub async fn open(dir: &Path) -> AppResult<Self> {
        let corpus = Corpus::load(dir)?;

        let config = if dir.join(EMBEDDING_CONFIG_FILE).exists() {
            EmbeddingConfig::load(dir)?
        } else {
            corpus.embedding_config().clone()
        };

        let embedder = Embedder::from_config(config).await?;
        Self::new(Arc::new(corpus), embedder)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Up to `top_k` articles, closest first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> AppResult<Vec<Article>> {
        Ok(self
            .retrieve_scored(query, top_k)
            .await?
            .into_iter()
            .map(|hit| hit.article)
            .collect())
    }

    /// Like [`retrieve`](Self::retrieve), with distance and store position
    /// attached to each article.
    pub async fn retrieve_scored(&self, query: &str, top_k: usize) -> AppResult<Vec<ScoredArticle>> {
        validate_query(query, top_k)?;

        let query_vector = self.embedder.embed(query).await?;
        let hits = search_store(self.corpus.index(), self.corpus.store(), &query_vector, top_k)?;

        tracing::debug!(
            "Retrieved {} of {} requested articles (best distance: {:?})",
            hits.len(),
            top_k,
            hits.first().map(|h| h.distance)
        );

        Ok(hits)
    }

    /// [`retrieve`](Self::retrieve) bounded by `timeout`.
    ///
    /// Expiry is reported as an embedding failure since the provider is the
    /// only part of retrieval that can block.
    pub async fn retrieve_with_timeout(
        &self,
        query: &str,
        top_k: usize,
        timeout: Duration,
    ) -> AppResult<Vec<Article>> {
        tokio::time::timeout(timeout, self.retrieve(query, top_k))
            .await
            .map_err(|_| {
                AppError::Embedding(format!(
                    "retrieval timed out after {}ms",
                    timeout.as_millis()
                ))
            })?
    }
}

fn validate_query(query: &str, top_k: usize) -> AppResult<()> {
    if query.trim().is_empty() {
        return Err(AppError::InvalidQuery("query is empty".to_string()));
    }

    if top_k == 0 {
        return Err(AppError::InvalidQuery("top_k must be positive".to_string()));
    }

    Ok(())
}

/// Map index hits to articles in rank order, skipping the "no match"
/// sentinel and any position the store does not hold.
fn resolve_hits(store: &ArticleStore, neighbors: Vec<Neighbor>) -> Vec<ScoredArticle> {
    neighbors
        .into_iter()
        .filter_map(|neighbor| {
            let position = neighbor.position?;
            match store.get(position) {
                Some(article) => Some(ScoredArticle {
                    article: article.clone(),
                    distance: neighbor.distance,
                    position,
                }),
                None => {
                    tracing::warn!(
                        "Index returned position {} beyond article store of {}",
                        position,
                        store.len()
                    );
                    None
                }
            }
        })
        .collect()
}

/// Search `index` and resolve the hits against `store`.
pub fn search_store(
    index: &dyn VectorIndex,
    store: &ArticleStore,
    query_vector: &[f32],
    top_k: usize,
) -> AppResult<Vec<ScoredArticle>> {
    let neighbors = index.search(query_vector, top_k)?;
    Ok(resolve_hits(store, neighbors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use crate::progress::ProgressReporter;

    /// Index that pads results with the sentinel and an out-of-range hit.
    struct PaddingIndex;

    impl VectorIndex for PaddingIndex {
        fn dimension(&self) -> usize {
            2
        }

        fn len(&self) -> usize {
            1
        }

        fn add(&mut self, _vectors: &[Vec<f32>]) -> AppResult<()> {
            Ok(())
        }

        fn search(&self, _query: &[f32], _k: usize) -> AppResult<Vec<Neighbor>> {
            Ok(vec![
                Neighbor::new(0.5, 0),
                Neighbor::missing(),
                Neighbor::new(0.7, 5),
            ])
        }
    }

    #[test]
    fn test_sentinel_and_out_of_range_skipped() {
        let store = ArticleStore::new(vec![Article::new("A", "d", "visa", "u1")]);

        let hits = search_store(&PaddingIndex, &store, &[0.0, 0.0], 3).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[0].article.url, "u1");
    }

    #[test]
    fn test_validate_query() {
        assert!(matches!(validate_query("", 3), Err(AppError::InvalidQuery(_))));
        assert!(matches!(validate_query(" \t\n", 3), Err(AppError::InvalidQuery(_))));
        assert!(matches!(validate_query("visa", 0), Err(AppError::InvalidQuery(_))));
        assert!(validate_query("visa", 1).is_ok());
    }

    fn mock_config(dimensions: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "mock".to_string(),
            model: "mock-v1".to_string(),
            dimensions,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mismatched_embedder_rejected() {
        let embedder = Embedder::new(Arc::new(MockProvider::new(4)), mock_config(4)).unwrap();
        let (corpus, _) = Corpus::build(ArticleStore::default(), &embedder, &ProgressReporter::noop())
            .await
            .unwrap();

        let other = Embedder::from_config(EmbeddingConfig {
            dimensions: 4,
            ..Default::default()
        })
        .await
        .unwrap();

        let err = RetrievalContext::new(Arc::new(corpus), other).unwrap_err();
        assert!(err.kind().is_fatal());
    }

    #[tokio::test]
    async fn test_timeout_maps_to_embedding_failure() {
        let provider = Arc::new(MockProvider::new(4));
        let embedder = Embedder::new(provider, mock_config(4)).unwrap();
        let store = ArticleStore::new(vec![Article::new("A", "d", "visa rules", "u1")]);
        let (corpus, _) = Corpus::build(store, &embedder, &ProgressReporter::noop())
            .await
            .unwrap();

        let slow = Embedder::new(
            Arc::new(MockProvider::new(4).with_delay(Duration::from_millis(200))),
            mock_config(4),
        )
        .unwrap();
        let ctx = RetrievalContext::new(Arc::new(corpus), slow).unwrap();

        let err = ctx
            .retrieve_with_timeout("visa", 1, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("timed out"));

        let ok = ctx
            .retrieve_with_timeout("visa", 1, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(ok.len(), 1);
    }
}
