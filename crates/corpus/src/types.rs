//! Core types for the article corpus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A scraped regional-alert article.
///
/// Field names match the scraper's JSON output. Any field except `url` may be
/// `null`; `date` is kept as free text and never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    pub url: String,
}

impl Article {
    /// Create an article with every optional field populated.
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        content: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            date: Some(date.into()),
            content: Some(content.into()),
            url: url.into(),
        }
    }

    /// Content trimmed of surrounding whitespace, or `None` when there is
    /// nothing to embed.
    pub fn embeddable_content(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// An article returned by retrieval together with its ranking data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub article: Article,

    /// Squared L2 distance to the query vector (lower is closer)
    pub distance: f32,

    /// Position in the article store
    pub position: usize,
}

/// Statistics from a corpus build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub build_id: Uuid,
    pub corpus_dir: PathBuf,
    pub articles_read: usize,
    pub articles_indexed: usize,
    pub articles_dropped: usize,
    pub dimension: usize,
    pub duration_secs: f64,
}

/// Summary of a persisted corpus, read from its manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusStats {
    pub build_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub article_count: usize,
    pub dimension: usize,
    pub metric: String,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub normalize: bool,
    pub articles_bytes: u64,
    pub index_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_deserializes_scraper_nulls() {
        let json = r#"{"title": null, "date": null, "content": null, "url": "https://example.com/a"}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert!(article.title.is_none());
        assert!(article.embeddable_content().is_none());
        assert_eq!(article.url, "https://example.com/a");
    }

    #[test]
    fn test_embeddable_content_trims() {
        let mut article = Article::new("T", "D", "  \n\t ", "u");
        assert!(article.embeddable_content().is_none());

        article.content = Some("  visa rules changed \n".to_string());
        assert_eq!(article.embeddable_content(), Some("visa rules changed"));
    }

    #[test]
    fn test_article_requires_url() {
        let json = r#"{"title": "x", "content": "y"}"#;
        assert!(serde_json::from_str::<Article>(json).is_err());
    }
}
