//! The corpus aggregate: article store and vector index, built, saved and
//! loaded together so their positions can never drift apart.

use crate::embeddings::{Embedder, EmbeddingConfig};
use crate::flat_index::FlatL2Index;
use crate::manifest::{sha256_file, verify_checksum, Checksums, CorpusManifest, METRIC_L2_SQUARED};
use crate::progress::ProgressReporter;
use crate::store::ArticleStore;
use crate::types::CorpusStats;
use crate::vector_index::VectorIndex;
use alertsbot_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const ARTICLES_FILE: &str = "articles.json";
pub const INDEX_FILE: &str = "index.bin";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Articles plus their vectors, aligned by position.
#[derive(Debug, Clone)]
pub struct Corpus {
    store: ArticleStore,
    index: FlatL2Index,
    build_id: Uuid,
    created_at: DateTime<Utc>,
    embedding: EmbeddingConfig,
}

impl Corpus {
    /// Embed every article with content and index the vectors in order.
    ///
    /// Articles without content are dropped first (each one logged); the
    /// returned count says how many. Zero usable articles yield an empty
    /// corpus, not an error.
    pub async fn build(
        articles: ArticleStore,
        embedder: &Embedder,
        progress: &ProgressReporter,
    ) -> AppResult<(Self, usize)> {
        let read = articles.len() as u64;
        let (store, dropped) = articles.retain_embeddable();
        progress.filter(store.len() as u64, Some(read), dropped);

        let texts: Vec<String> = store
            .iter()
            .filter_map(|a| a.embeddable_content())
            .map(str::to_string)
            .collect();
        let total = texts.len() as u64;

        let mut index = FlatL2Index::new(embedder.dimensions());
        let mut done = 0u64;

        for batch in texts.chunks(embedder.config().batch_size) {
            let vectors = embedder.embed_batch(batch).await?;
            index.add(&vectors)?;
            done += batch.len() as u64;
            progress.embed(done, Some(total), &embedder.config().model);
        }

        if index.len() != store.len() {
            return Err(AppError::Corpus(format!(
                "Index holds {} vectors for {} articles",
                index.len(),
                store.len()
            )));
        }

        let corpus = Self {
            store,
            index,
            build_id: Uuid::new_v4(),
            created_at: Utc::now(),
            embedding: embedder.config().clone(),
        };

        tracing::info!(
            "Built corpus {} with {} articles ({} dropped)",
            corpus.build_id,
            corpus.len(),
            dropped
        );

        Ok((corpus, dropped))
    }

    /// Write all artifacts into `dir`.
    ///
    /// Every file is written under a temporary name first and only renamed
    /// into place once all of them exist; the manifest is renamed last.
    pub fn save(&self, dir: &Path, progress: &ProgressReporter) -> AppResult<CorpusManifest> {
        fs::create_dir_all(dir).map_err(|e| {
            AppError::Corpus(format!("Failed to create corpus directory {:?}: {}", dir, e))
        })?;

        self.embedding.save(dir)?;

        let articles_tmp = tmp_path(dir, ARTICLES_FILE);
        let index_tmp = tmp_path(dir, INDEX_FILE);
        let manifest_tmp = tmp_path(dir, MANIFEST_FILE);

        let result = (|| -> AppResult<CorpusManifest> {
            self.store.save(&articles_tmp)?;
            progress.write(1, Some(3), ARTICLES_FILE);

            self.index.write_to(&index_tmp, self.build_id)?;
            progress.write(2, Some(3), INDEX_FILE);

            let checksums = Checksums {
                articles: sha256_file(&articles_tmp)?,
                index: sha256_file(&index_tmp)?,
            };

            let mut manifest =
                CorpusManifest::new(self.build_id, self.len(), &self.embedding, checksums);
            manifest.created_at = self.created_at;
            manifest.save(&manifest_tmp)?;
            progress.write(3, Some(3), MANIFEST_FILE);

            fs::rename(&articles_tmp, dir.join(ARTICLES_FILE))?;
            fs::rename(&index_tmp, dir.join(INDEX_FILE))?;
            fs::rename(&manifest_tmp, dir.join(MANIFEST_FILE))?;

            Ok(manifest)
        })();

        if result.is_err() {
            for tmp in [&articles_tmp, &index_tmp, &manifest_tmp] {
                let _ = fs::remove_file(tmp);
            }
        }

        let manifest = result?;
        tracing::info!("Saved corpus {} to {:?}", self.build_id, dir);
        Ok(manifest)
    }

    /// Load and cross-check a corpus written by [`Corpus::save`].
    ///
    /// Any missing, corrupt or mismatched artifact is `IndexUnavailable`.
    pub fn load(dir: &Path) -> AppResult<Self> {
        let manifest = CorpusManifest::load(&dir.join(MANIFEST_FILE))?;

        if manifest.metric != METRIC_L2_SQUARED {
            return Err(AppError::IndexUnavailable(format!(
                "Unsupported metric '{}'",
                manifest.metric
            )));
        }

        let articles_path = dir.join(ARTICLES_FILE);
        let index_path = dir.join(INDEX_FILE);
        verify_checksum(&articles_path, &manifest.checksums.articles)?;
        verify_checksum(&index_path, &manifest.checksums.index)?;

        let store = ArticleStore::load(&articles_path)?;
        let (index, build_id) = FlatL2Index::read_from(&index_path)?;

        if build_id != manifest.build_id {
            return Err(AppError::IndexUnavailable(format!(
                "Index build {} does not match manifest build {}",
                build_id, manifest.build_id
            )));
        }

        if index.dimension() != manifest.dimension {
            return Err(AppError::IndexUnavailable(format!(
                "Index dimension {} does not match manifest dimension {}",
                index.dimension(),
                manifest.dimension
            )));
        }

        if index.len() != store.len() || store.len() != manifest.article_count {
            return Err(AppError::IndexUnavailable(format!(
                "Article store has {} records, index has {} vectors, manifest expects {}",
                store.len(),
                index.len(),
                manifest.article_count
            )));
        }

        tracing::debug!(
            "Loaded corpus {} ({} articles, dimension {})",
            build_id,
            store.len(),
            index.dimension()
        );

        Ok(Self {
            store,
            index,
            build_id,
            created_at: manifest.created_at,
            embedding: manifest.embedding_config(),
        })
    }

    /// Summarise a saved corpus from its manifest without loading vectors.
    pub fn stats(dir: &Path) -> AppResult<CorpusStats> {
        let manifest = CorpusManifest::load(&dir.join(MANIFEST_FILE))?;
        let size = |name: &str| fs::metadata(dir.join(name)).map(|m| m.len()).unwrap_or(0);

        Ok(CorpusStats {
            build_id: manifest.build_id,
            created_at: manifest.created_at,
            article_count: manifest.article_count,
            dimension: manifest.dimension,
            metric: manifest.metric.clone(),
            embedding_provider: manifest.embedding.provider.clone(),
            embedding_model: manifest.embedding.model.clone(),
            normalize: manifest.embedding.normalize,
            articles_bytes: size(ARTICLES_FILE),
            index_bytes: size(INDEX_FILE),
        })
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    /// Embedding settings the vectors were produced with.
    pub fn embedding_config(&self) -> &EmbeddingConfig {
        &self.embedding
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

fn tmp_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(".{}.tmp", name))
}
