//! Command handlers for the alertsbot CLI.
//!
//! This module organizes all CLI commands into separate submodules and holds
//! the helpers they share: opening the corpus, resolving `top_k` and turning
//! errors into user-facing messages.

pub mod ask;
pub mod build;
pub mod chat;
pub mod context;
pub mod prompts;
pub mod search;
pub mod stats;

pub use ask::AskCommand;
pub use build::BuildCommand;
pub use chat::ChatCommand;
pub use context::ContextCommand;
pub use prompts::PromptsCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;

use alertsbot_core::{config::AppConfig, AppError, AppResult, ErrorKind};
use alertsbot_corpus::RetrievalContext;
use serde::Serialize;

/// Load the corpus and its query embedder.
///
/// Any failure here is `IndexUnavailable` or an embedding provider error;
/// the command cannot serve queries without them.
pub async fn open_retrieval(config: &AppConfig) -> AppResult<RetrievalContext> {
    let corpus_dir = config.corpus_dir();
    tracing::debug!("Opening corpus at {:?}", corpus_dir);

    let ctx = RetrievalContext::open(&corpus_dir).await?;

    tracing::info!(
        "Corpus {} loaded ({} articles, {})",
        ctx.corpus().build_id(),
        ctx.corpus().len(),
        ctx.embedder().config().model
    );

    Ok(ctx)
}

/// `-k` from the command line, else `corpus.topK` from config.
pub fn resolve_top_k(flag: Option<usize>, config: &AppConfig) -> usize {
    flag.unwrap_or(config.corpus.top_k as usize)
}

pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Message shown for a model failure in place of an answer.
pub fn generation_failed_message(err: &AppError) -> String {
    format!("An error occurred while generating the response: {}", err)
}

/// User-facing message for an error, one wording per kind.
pub fn describe_error(err: &AppError) -> String {
    match err.kind() {
        ErrorKind::IndexUnavailable => format!(
            "The article corpus could not be loaded: {}. Run 'alertsbot build --articles <file>' first.",
            err
        ),
        ErrorKind::InvalidQuery => format!("Please enter a question ({}).", err),
        ErrorKind::EmbeddingFailure => format!("The query could not be processed: {}", err),
        ErrorKind::NoRelevantContext => {
            "No relevant articles were found for that question.".to_string()
        }
        ErrorKind::Llm => generation_failed_message(err),
        ErrorKind::Config => format!("Configuration problem: {}", err),
        _ => format!("Error: {}", err),
    }
}

/// Process exit status for an error.
pub fn exit_code(err: &AppError) -> i32 {
    match err.kind() {
        ErrorKind::IndexUnavailable => 3,
        ErrorKind::InvalidQuery => 2,
        ErrorKind::Config => 78,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_has_its_own_message() {
        let errors = [
            AppError::IndexUnavailable("manifest.json missing".to_string()),
            AppError::InvalidQuery("query is empty".to_string()),
            AppError::Embedding("provider down".to_string()),
            AppError::NoRelevantContext,
            AppError::Llm("quota exceeded".to_string()),
            AppError::Config("bad provider".to_string()),
        ];

        let messages: Vec<String> = errors.iter().map(describe_error).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }

        assert!(messages[0].contains("alertsbot build"));
        assert!(messages[4].starts_with("An error occurred while generating the response:"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&AppError::IndexUnavailable("x".to_string())), 3);
        assert_eq!(exit_code(&AppError::InvalidQuery("x".to_string())), 2);
        assert_eq!(exit_code(&AppError::Llm("x".to_string())), 1);
    }

    #[test]
    fn test_resolve_top_k() {
        let config = AppConfig::default();
        assert_eq!(resolve_top_k(Some(7), &config), 7);
        assert_eq!(resolve_top_k(None, &config), config.corpus.top_k as usize);
    }
}
