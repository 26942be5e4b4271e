//! Ordered article store persisted as a JSON array.

use crate::types::Article;
use alertsbot_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Ordered collection of articles. Position `i` here is position `i` in the
/// vector index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleStore {
    articles: Vec<Article>,
}

impl ArticleStore {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Article at `position`, if in range.
    pub fn get(&self, position: usize) -> Option<&Article> {
        self.articles.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter()
    }

    /// Read a scraper-produced JSON array of articles.
    pub fn import(path: &Path) -> AppResult<Self> {
        tracing::debug!("Importing articles from {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Corpus(format!("Failed to read articles at {:?}: {}", path, e))
        })?;

        let articles: Vec<Article> = serde_json::from_str(&content).map_err(|e| {
            AppError::Corpus(format!("Failed to parse articles at {:?}: {}", path, e))
        })?;

        tracing::info!("Imported {} articles from {:?}", articles.len(), path);
        Ok(Self::new(articles))
    }

    /// Load a persisted store snapshot belonging to a built corpus.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::IndexUnavailable(format!("Cannot read article store {:?}: {}", path, e))
        })?;

        let articles: Vec<Article> = serde_json::from_str(&content).map_err(|e| {
            AppError::IndexUnavailable(format!("Corrupt article store {:?}: {}", path, e))
        })?;

        Ok(Self::new(articles))
    }

    /// Write the store as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let json = serde_json::to_string_pretty(&self.articles)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Drop articles with absent or blank content, keeping order.
    ///
    /// Returns the filtered store and the number of dropped records.
    pub fn retain_embeddable(self) -> (Self, usize) {
        let before = self.articles.len();
        let kept: Vec<Article> = self
            .articles
            .into_iter()
            .enumerate()
            .filter_map(|(i, article)| {
                if article.embeddable_content().is_some() {
                    Some(article)
                } else {
                    tracing::warn!(
                        "Skipping article {} ({}): no content to embed",
                        i,
                        article.url
                    );
                    None
                }
            })
            .collect();

        let dropped = before - kept.len();
        (Self::new(kept), dropped)
    }
}
