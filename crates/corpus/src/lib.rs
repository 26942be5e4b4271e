//! Article corpus and retrieval pipeline.
//!
//! Scraped articles are embedded into a flat squared-L2 index that stays
//! aligned with the article store by position. At query time a
//! [`RetrievalContext`] embeds the question, finds the nearest articles and
//! the context assembler renders them for the answer model.

pub mod answer;
pub mod context;
pub mod corpus;
pub mod embeddings;
pub mod flat_index;
pub mod manifest;
pub mod progress;
pub mod retriever;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use answer::{answer, answer_stream, AnswerOptions, AnswerResponse, SourceRef, StreamedAnswer, NO_CONTEXT_ANSWER};
pub use context::{assemble_context, format_article, AssembledContext};
pub use corpus::Corpus;
pub use embeddings::{Embedder, EmbeddingConfig, EmbeddingProvider};
pub use flat_index::FlatL2Index;
pub use manifest::CorpusManifest;
pub use progress::{ProgressEvent, ProgressReporter};
pub use retriever::RetrievalContext;
pub use store::ArticleStore;
pub use types::{Article, BuildStats, CorpusStats, ScoredArticle};
pub use vector_index::{Neighbor, VectorIndex};

use alertsbot_core::AppResult;
use std::path::Path;
use std::time::Instant;

/// Import a scraper JSON file and build a corpus from it in `corpus_dir`.
///
/// An existing corpus in the directory is replaced only once the new one has
/// been written completely.
pub async fn build_corpus(
    articles_path: &Path,
    corpus_dir: &Path,
    embedding: EmbeddingConfig,
    progress: &ProgressReporter,
) -> AppResult<BuildStats> {
    let start = Instant::now();

    tracing::info!(
        "Building corpus from {:?} into {:?} (provider: {}, model: {})",
        articles_path,
        corpus_dir,
        embedding.provider,
        embedding.model
    );

    let articles = ArticleStore::import(articles_path)?;
    let articles_read = articles.len();
    progress.import(articles_read as u64, &articles_path.display().to_string());

    let embedder = Embedder::from_config(embedding).await?;
    let (corpus, dropped) = Corpus::build(articles, &embedder, progress).await?;
    let manifest = corpus.save(corpus_dir, progress)?;

    let duration = start.elapsed();

    tracing::info!(
        "Corpus build completed: {} articles indexed, {} dropped in {:.2}s",
        manifest.article_count,
        dropped,
        duration.as_secs_f64()
    );

    Ok(BuildStats {
        build_id: manifest.build_id,
        corpus_dir: corpus_dir.to_path_buf(),
        articles_read,
        articles_indexed: manifest.article_count,
        articles_dropped: dropped,
        dimension: manifest.dimension,
        duration_secs: duration.as_secs_f64(),
    })
}
