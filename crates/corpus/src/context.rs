//! Render retrieved articles into the context block handed to the model.

use crate::types::Article;

const NO_TITLE: &str = "No Title";
const NO_DATE: &str = "No Date";

/// Outcome of assembling context for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembledContext {
    /// Formatted article blocks, in rank order.
    Context(String),

    /// Retrieval returned nothing; there is no context to give.
    NoRelevantContext,
}

impl AssembledContext {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AssembledContext::Context(text) => Some(text),
            AssembledContext::NoRelevantContext => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AssembledContext::NoRelevantContext)
    }
}

/// Format one article as a `Title/Date/URL/Content` block.
pub fn format_article(article: &Article) -> String {
    format!(
        "Title: {}\nDate: {}\nURL: {}\nContent: {}\n",
        article.title.as_deref().unwrap_or(NO_TITLE),
        article.date.as_deref().unwrap_or(NO_DATE),
        article.url,
        article.content.as_deref().unwrap_or_default(),
    )
}

/// Join article blocks in the order given, separated by a blank line.
pub fn assemble_context(articles: &[Article]) -> AssembledContext {
    if articles.is_empty() {
        return AssembledContext::NoRelevantContext;
    }

    let blocks: Vec<String> = articles.iter().map(format_article).collect();
    AssembledContext::Context(blocks.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_full_article() {
        let article = Article::new("Visa update", "2 Jan 2025", "visa rules changed", "https://x/a");
        assert_eq!(
            format_article(&article),
            "Title: Visa update\nDate: 2 Jan 2025\nURL: https://x/a\nContent: visa rules changed\n"
        );
    }

    #[test]
    fn test_format_defaults() {
        let article = Article {
            title: None,
            date: None,
            content: Some("tax deadline extended".to_string()),
            url: "u2".to_string(),
        };
        let block = format_article(&article);
        assert!(block.starts_with("Title: No Title\nDate: No Date\n"));
    }

    #[test]
    fn test_assemble_keeps_rank_order() {
        let a = Article::new("A", "d1", "first", "u1");
        let b = Article::new("B", "d2", "second", "u2");

        let text = match assemble_context(&[b.clone(), a.clone()]) {
            AssembledContext::Context(text) => text,
            AssembledContext::NoRelevantContext => panic!("expected context"),
        };

        assert_eq!(text, format!("{}\n{}", format_article(&b), format_article(&a)));
        assert!(text.find("Title: B").unwrap() < text.find("Title: A").unwrap());
        assert!(text.contains("Content: second\n\nTitle: A"));
    }

    #[test]
    fn test_assemble_empty_is_no_relevant_context() {
        let assembled = assemble_context(&[]);
        assert_eq!(assembled, AssembledContext::NoRelevantContext);
        assert!(assembled.as_text().is_none());
        assert!(assembled.is_empty());
    }
}
